//! realm-sync: command line client for the message sync core.
//!
//! Every signal the core emits is printed to stdout as one JSON line.
//! Logs go to `~/.realm-sync/logs/realm-sync.jsonl` and stderr.

mod app;
mod cli;
mod sink;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use sync_api_client::ApiCredentials;
use sync_config_and_utils::{init_logging, Config, Paths};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let paths = match &args.base_dir {
        Some(dir) => Paths::with_base_dir(dir.clone()),
        None => Paths::new()?,
    };
    let mut config = Config::load(&paths).context("Failed to load config")?;
    if let Some(realm) = &args.realm {
        config.realm_url = Some(realm.clone());
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    config.validate()?;

    let log_file = init_logging(&config.log_level, &paths)?;
    info!(
        realm = ?config.realm_url,
        log_file = %log_file.display(),
        messages_per_request = config.messages_per_request,
        min_recent_pm_version = %config.min_recent_pm_version,
        "Starting realm-sync"
    );

    let app = app::App::new(
        &config,
        ApiCredentials {
            email: args.email,
            api_key: args.api_key,
        },
    )?;

    tokio::select! {
        result = app.run(args.command) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    }
}
