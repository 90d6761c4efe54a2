//! Retry policy: retry transient failures forever, abort on terminal ones.

use crate::backoff::{Backoff, BackoffConfig, ExponentialBackoff};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use sync_types::SyncError;
use tracing::{debug, info, warn};

/// Classifies an error for the retry policy.
pub trait RetryClass {
    /// Returns true if retrying cannot help.
    fn is_terminal(&self) -> bool;
}

impl RetryClass for SyncError {
    fn is_terminal(&self) -> bool {
        SyncError::is_terminal(self)
    }
}

/// Hook notified before every backoff sleep.
pub trait RetryObserver: Send + Sync {
    fn on_retry(&self, label: &str, attempt: u32, delay: Duration);
}

/// Retry `operation` until it succeeds or returns a terminal error.
///
/// There is no attempt limit. `backoff` supplies the delay slept after each
/// transient failure.
pub async fn retry_until_terminal<T, E, B, Op, Fut>(
    label: &str,
    backoff: B,
    operation: Op,
) -> Result<T, E>
where
    E: RetryClass + Display,
    B: Backoff,
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_observed(label, backoff, None, operation).await
}

async fn retry_observed<T, E, B, Op, Fut>(
    label: &str,
    mut backoff: B,
    observer: Option<&dyn RetryObserver>,
    mut operation: Op,
) -> Result<T, E>
where
    E: RetryClass + Display,
    B: Backoff,
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 0;

    loop {
        attempt = attempt.saturating_add(1);

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(label, attempt, "Operation succeeded after retrying");
                } else {
                    debug!(label, "Operation succeeded");
                }
                return Ok(value);
            }
            Err(e) if e.is_terminal() => {
                warn!(label, attempt, error = %e, "Operation failed with terminal error, not retrying");
                return Err(e);
            }
            Err(e) => {
                let delay = backoff.next_delay();
                warn!(
                    label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Operation failed with transient error, retrying"
                );
                if let Some(observer) = observer {
                    observer.on_retry(label, attempt, delay);
                }
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// The retry policy used for startup-critical calls.
///
/// Each [`run`](Self::run) gets its own [`ExponentialBackoff`], so backoff
/// state never leaks between invocations.
#[derive(Clone, Default)]
pub struct BackoffRetrier {
    config: BackoffConfig,
    observer: Option<Arc<dyn RetryObserver>>,
}

impl BackoffRetrier {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    /// Attach an observer that sees every retry before its sleep.
    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    /// Run `operation` under this policy.
    pub async fn run<T, E, Op, Fut>(&self, label: &str, operation: Op) -> Result<T, E>
    where
        E: RetryClass + Display,
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let backoff = ExponentialBackoff::new(self.config.clone());
        retry_observed(label, backoff, self.observer.as_deref(), operation).await
    }
}
