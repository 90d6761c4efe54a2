//! Configuration, paths, and logging setup for realm-sync.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{BackoffSettings, Config, DEFAULT_LOG_LEVEL, DEFAULT_MIN_RECENT_PM_VERSION};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
