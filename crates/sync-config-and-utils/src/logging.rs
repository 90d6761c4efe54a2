//! Logging initialization.
//!
//! All crates log through `tracing`; this wires the binary to the
//! observability package, which writes structured JSONL to
//! `~/.realm-sync/logs/realm-sync.jsonl` and a compact copy to stderr.

use crate::{CoreResult, Paths};
use std::path::PathBuf;

const SERVICE_NAME: &str = "realm-sync";

/// Initialize logging for the binary.
///
/// `level` is the default filter; `RUST_LOG` overrides it. Returns the log
/// file in use.
///
/// ```ignore
/// let log_file = init_logging("info", &paths)?;
/// tracing::info!(log_file = %log_file.display(), "realm-sync started");
/// ```
pub fn init_logging(level: &str, paths: &Paths) -> CoreResult<PathBuf> {
    paths.ensure_dirs()?;
    let log_path = observability::init_with_config(observability::LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: level.into(),
        log_path: Some(paths.log_file()),
        also_stderr: true,
    })?;
    Ok(log_path)
}

/// Parse a log level name (case-insensitive).
pub fn parse_level(level: &str) -> Option<tracing::Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(tracing::Level::TRACE),
        "debug" => Some(tracing::Level::DEBUG),
        "info" => Some(tracing::Level::INFO),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "error" => Some(tracing::Level::ERROR),
        _ => None,
    }
}
