//! Jittered exponential backoff.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Upper bound on the exponent so the ceiling computation stays finite.
const MAX_EXPONENT: i32 = 63;

/// Configuration for backoff delays.
///
/// # Backoff Calculation
///
/// The ceiling for attempt `n` (0-indexed) is
/// `initial_delay * multiplier^n`, capped at `max_delay`. Each returned delay
/// is the ceiling reduced by a random fraction in `[0, jitter)`, and never
/// smaller than the delay returned before it. With the defaults:
///
/// | Attempt | Ceiling |
/// |---------|---------|
/// | 0       | 100ms   |
/// | 1       | 200ms   |
/// | 2       | 400ms   |
/// | ...     | ...     |
/// | 7+      | 10s (capped) |
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Ceiling of the first delay.
    pub initial_delay: Duration,
    /// Maximum ceiling (caps exponential growth).
    pub max_delay: Duration,
    /// Growth factor between attempts (values below 1.0 are treated as 1.0).
    pub multiplier: f64,
    /// Largest fraction of the ceiling removed by jitter, in `[0, 1]`.
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: 0.5,
        }
    }
}

impl BackoffConfig {
    /// Ceiling for a given attempt number (0-indexed), before jitter.
    pub fn ceiling_for_attempt(&self, attempt: u32) -> Duration {
        let initial_ms = self.initial_delay.as_millis() as f64;
        let max_ms = self.max_delay.as_millis().max(self.initial_delay.as_millis()) as f64;
        let exponent = (attempt as i32).min(MAX_EXPONENT);
        let ceiling_ms = (initial_ms * self.multiplier.max(1.0).powi(exponent)).min(max_ms);
        Duration::from_millis(ceiling_ms as u64)
    }
}

/// Source of successive retry delays.
pub trait Backoff: Send {
    fn next_delay(&mut self) -> Duration;
}

/// Exponential backoff with jitter and a monotone floor.
pub struct ExponentialBackoff {
    config: BackoffConfig,
    attempt: u32,
    previous: Duration,
    rng: StdRng,
}

impl ExponentialBackoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic jitter, for tests and reproducible runs.
    pub fn with_seed(config: BackoffConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: BackoffConfig, rng: StdRng) -> Self {
        Self {
            config,
            attempt: 0,
            previous: Duration::ZERO,
            rng,
        }
    }

    /// Number of delays handed out so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}

impl Backoff for ExponentialBackoff {
    fn next_delay(&mut self) -> Duration {
        let ceiling = self.config.ceiling_for_attempt(self.attempt);
        self.attempt = self.attempt.saturating_add(1);

        let jitter = self.config.jitter.clamp(0.0, 1.0);
        let cut = if jitter > 0.0 {
            self.rng.gen::<f64>() * jitter
        } else {
            0.0
        };
        let jittered = ceiling.mul_f64(1.0 - cut);

        let delay = jittered.max(self.previous);
        self.previous = delay;
        delay
    }
}
