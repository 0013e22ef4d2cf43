//! Randomized delay applied before each request.
//!
//! Throttles the request rate toward the source site. The delay is per
//! fetch, so concurrent fetches each wait their own delay.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::types::config::PacingConfig;

/// Uniform random delay between `min` and `max` (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingDelay {
    min: Duration,
    max: Duration,
}

impl PacingDelay {
    /// Create a delay range. Bounds are swapped if given in reverse.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// No delay at all (tests, local fixtures).
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(
            Duration::from_secs(config.min_seconds),
            Duration::from_secs(config.max_seconds),
        )
    }

    pub fn is_disabled(&self) -> bool {
        self.max.is_zero()
    }

    /// Draw one delay from the range.
    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let millis = rand::thread_rng().gen_range(self.min.as_millis()..=self.max.as_millis());
        Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    /// Sleep for a sampled delay.
    pub async fn wait(&self) {
        if self.is_disabled() {
            return;
        }
        let delay = self.sample();
        debug!(delay_ms = delay.as_millis() as u64, "Pacing before request");
        tokio::time::sleep(delay).await;
    }
}

impl Default for PacingDelay {
    fn default() -> Self {
        Self::from_config(&PacingConfig::default())
    }
}
