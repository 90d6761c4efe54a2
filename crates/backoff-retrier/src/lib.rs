//! # Backoff Retrier
//!
//! Wraps an asynchronous operation and retries it until it succeeds or fails
//! with a terminal error.
//!
//! ## Overview
//!
//! - **[`ExponentialBackoff`]**: produces jittered, non-decreasing delays
//!   that plateau at a configured cap. One instance lives for exactly one
//!   retried-operation invocation.
//!
//! - **[`BackoffRetrier`]**: the retry policy. Transient failures sleep for
//!   the next backoff delay and try again with no attempt limit; terminal
//!   failures (see [`RetryClass`]) are returned immediately.
//!
//! Dropping the future returned by [`BackoffRetrier::run`] is the only way to
//! stop a retry loop early.
//!
//! ## Example
//!
//! ```ignore
//! use backoff_retrier::{BackoffConfig, BackoffRetrier};
//!
//! let retrier = BackoffRetrier::new(BackoffConfig::default());
//! let metadata = retrier.run("server_metadata", || api.server_metadata()).await?;
//! ```

mod backoff;
mod retrier;

pub use backoff::{Backoff, BackoffConfig, ExponentialBackoff};
pub use retrier::{retry_until_terminal, BackoffRetrier, RetryClass, RetryObserver};
