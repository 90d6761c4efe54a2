//! Wiring of the sync core against a live realm.

use crate::cli::{Command, NarrowArgs};
use crate::sink::PrintingSink;
use anyhow::{bail, Context, Result};
use backoff_retrier::{BackoffConfig, BackoffRetrier};
use bootstrap_orchestrator::{BootstrapConfig, BootstrapOrchestrator, BootstrapOutcome};
use message_fetch_coordinator::{
    upload_attachment, FetchCoordinatorConfig, MemorySessionStore, MessageFetchCoordinator,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use sync_api_client::{ApiClient, ApiCredentials};
use sync_config_and_utils::{BackoffSettings, Config};
use sync_types::{Anchor, Direction, FetchOutcome, ServerVersion};
use tracing::info;

pub fn backoff_config(settings: &BackoffSettings) -> BackoffConfig {
    BackoffConfig {
        initial_delay: Duration::from_millis(settings.initial_delay_ms),
        max_delay: Duration::from_millis(settings.max_delay_ms),
        multiplier: settings.multiplier,
        jitter: settings.jitter,
    }
}

/// One session's worth of sync components.
pub struct App {
    client: Arc<ApiClient>,
    store: Arc<MemorySessionStore>,
    coordinator: Arc<MessageFetchCoordinator>,
    orchestrator: BootstrapOrchestrator,
}

impl App {
    pub fn new(config: &Config, credentials: ApiCredentials) -> Result<Self> {
        let realm = config.realm_url()?;
        let client = Arc::new(
            ApiClient::new(
                realm,
                credentials,
                Duration::from_secs(config.request_timeout_secs),
            )
            .context("Failed to build HTTP client")?,
        );
        info!(realm = %client.realm(), "Using realm");
        let min_recent_pm_version: ServerVersion = config
            .min_recent_pm_version
            .parse()
            .context("min_recent_pm_version")?;

        let store = Arc::new(MemorySessionStore::new());
        let sink = Arc::new(PrintingSink::stdout(store.clone()));
        let coordinator = Arc::new(MessageFetchCoordinator::with_config(
            client.clone(),
            sink.clone(),
            FetchCoordinatorConfig {
                messages_per_request: config.messages_per_request,
                legacy_recent_pm_count: config.legacy_recent_pm_count,
            },
        ));
        let orchestrator =
            BootstrapOrchestrator::new(client.clone(), coordinator.clone(), store.clone(), sink)
                .with_retrier(BackoffRetrier::new(backoff_config(&config.backoff)))
                .with_config(BootstrapConfig {
                    min_recent_pm_version,
                    ..Default::default()
                });

        Ok(Self {
            client,
            store,
            coordinator,
            orchestrator,
        })
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Bootstrap => {
                self.bootstrap().await?;
            }
            Command::Fetch { narrow, anchor } => {
                self.bootstrap().await?;
                self.open(&narrow, anchor).await?;
            }
            Command::Older { narrow } => {
                self.bootstrap().await?;
                let narrow_value = self.open(&narrow, Anchor::Newest).await?;
                let outcome = self
                    .coordinator
                    .fetch_older(self.store.as_ref(), &narrow_value)
                    .await?;
                report_page(Direction::Older, outcome.as_ref());
            }
            Command::Upload { narrow, path, name } => {
                self.upload(&narrow, &path, name).await?;
            }
        }
        Ok(())
    }

    async fn bootstrap(&self) -> Result<()> {
        let outcome = self.orchestrator.run().await?;
        println!("{}", serde_json::to_string(&outcome)?);
        match outcome {
            BootstrapOutcome::Ready(report) => {
                info!(
                    server_version = %report.server_version,
                    queue_id = %report.queue_id,
                    "Session ready"
                );
                Ok(())
            }
            BootstrapOutcome::LoggedOut { cause } => bail!("Logged out: {cause}"),
        }
    }

    async fn open(&self, narrow: &NarrowArgs, anchor: Anchor) -> Result<sync_types::Narrow> {
        let narrow = narrow.to_narrow()?;
        let outcome = self
            .coordinator
            .fetch_messages_in_narrow(self.store.as_ref(), &narrow, anchor)
            .await?;
        match outcome {
            Some(outcome) => info!(
                count = outcome.messages.len(),
                found_oldest = outcome.found_oldest,
                found_newest = outcome.found_newest,
                "Narrow opened"
            ),
            None => info!(?narrow, "Narrow already caught up"),
        }
        Ok(narrow)
    }

    async fn upload(&self, narrow: &NarrowArgs, path: &Path, name: Option<String>) -> Result<()> {
        let narrow = narrow.to_narrow()?;
        let name = match name {
            Some(name) => name,
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .with_context(|| format!("{} has no file name", path.display()))?,
        };
        let content = upload_attachment(
            self.client.as_ref(),
            self.store.as_ref(),
            &narrow,
            path,
            &name,
        )
        .await?;
        println!("{}", serde_json::json!({ "queued": content }));
        Ok(())
    }
}

fn report_page(direction: Direction, outcome: Option<&FetchOutcome>) {
    match outcome {
        Some(outcome) => info!(
            ?direction,
            count = outcome.messages.len(),
            "Page fetched"
        ),
        None => info!(?direction, "Page skipped"),
    }
}
