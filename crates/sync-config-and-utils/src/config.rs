//! Configuration management.

use crate::logging::parse_level;
use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Oldest server version that includes recent private conversations in the
/// registration snapshot.
pub const DEFAULT_MIN_RECENT_PM_VERSION: &str = "2.1";

const ENV_LOG_LEVEL: &str = "REALM_SYNC_LOG_LEVEL";
const ENV_REALM_URL: &str = "REALM_SYNC_REALM_URL";

/// Retry backoff tuning, in the units written to the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffSettings {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    /// Largest fraction of each delay removed at random.
    pub jitter: f64,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            initial_delay_ms: 100,
            max_delay_ms: 10_000,
            multiplier: 2.0,
            jitter: 0.5,
        }
    }
}

/// Main configuration, read from `<base>/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Realm base URL, e.g. `https://chat.example.com`.
    pub realm_url: Option<String>,
    /// Page size for history fetches.
    pub messages_per_request: u32,
    /// Page size for the legacy recent private messages fetch.
    pub legacy_recent_pm_count: u32,
    /// Servers older than this get the legacy recent private messages fetch.
    pub min_recent_pm_version: String,
    pub backoff: BackoffSettings,
    /// Per-request HTTP timeout.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            realm_url: None,
            messages_per_request: 50,
            legacy_recent_pm_count: 100,
            min_recent_pm_version: DEFAULT_MIN_RECENT_PM_VERSION.to_string(),
            backoff: BackoffSettings::default(),
            request_timeout_secs: 60,
        }
    }
}

impl Config {
    /// Load configuration from the config file if present, falling back to
    /// defaults, then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file. Missing keys take defaults.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Override settings from environment variables. Empty values are ignored.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        if let Some(log_level) = non_empty(ENV_LOG_LEVEL) {
            self.log_level = log_level;
        }
        if let Some(realm_url) = non_empty(ENV_REALM_URL) {
            self.realm_url = Some(realm_url);
        }
    }

    /// The realm URL, parsed.
    pub fn realm_url(&self) -> CoreResult<Url> {
        let raw = self.realm_url.as_deref().ok_or(CoreError::MissingRealmUrl)?;
        let url = Url::parse(raw)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(CoreError::invalid(
                "realm_url",
                format!("unsupported scheme {other:?}"),
            )),
        }
    }

    /// Reject settings the sync core cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if parse_level(&self.log_level).is_none() {
            return Err(CoreError::invalid(
                "log_level",
                format!("unknown level {:?}", self.log_level),
            ));
        }
        if self.messages_per_request == 0 {
            return Err(CoreError::invalid("messages_per_request", "must be at least 1"));
        }
        if self.legacy_recent_pm_count == 0 {
            return Err(CoreError::invalid("legacy_recent_pm_count", "must be at least 1"));
        }
        if !self
            .min_recent_pm_version
            .starts_with(|c: char| c.is_ascii_digit())
        {
            return Err(CoreError::invalid(
                "min_recent_pm_version",
                "must start with a numeric major version",
            ));
        }
        let backoff = &self.backoff;
        if backoff.initial_delay_ms == 0 {
            return Err(CoreError::invalid("backoff.initial_delay_ms", "must be positive"));
        }
        if backoff.max_delay_ms < backoff.initial_delay_ms {
            return Err(CoreError::invalid(
                "backoff.max_delay_ms",
                "must not be below initial_delay_ms",
            ));
        }
        if backoff.multiplier.is_nan() || backoff.multiplier < 1.0 {
            return Err(CoreError::invalid("backoff.multiplier", "must be at least 1.0"));
        }
        if !(0.0..=1.0).contains(&backoff.jitter) {
            return Err(CoreError::invalid("backoff.jitter", "must be within [0, 1]"));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::invalid("request_timeout_secs", "must be positive"));
        }
        if self.realm_url.is_some() {
            self.realm_url()?;
        }
        Ok(())
    }
}
