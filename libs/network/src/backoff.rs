//! Reconnect backoff policy
//!
//! Defaults reproduce a plain fixed 5-second delay. Setting `backoff_multiplier`
//! above 1.0 gives capped exponential backoff, `jitter_ratio` spreads retries
//! from many supervisors, and `max_reconnect_attempts` turns endless retrying
//! into a circuit breaker.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::DEFAULT_RECONNECT_DELAY_MS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// Delay after the first failed cycle
    pub base_backoff_ms: u64,
    /// Growth factor per additional consecutive failure (1.0 = fixed delay)
    pub backoff_multiplier: f64,
    /// Upper bound for the un-jittered delay
    pub max_backoff_ms: u64,
    /// Symmetric jitter as a fraction of the delay, in [0, 1)
    pub jitter_ratio: f64,
    /// Consecutive failed cycles before the network is declared unavailable
    pub max_reconnect_attempts: Option<u32>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_backoff_ms: DEFAULT_RECONNECT_DELAY_MS,
            backoff_multiplier: 1.0,
            max_backoff_ms: 60_000,
            jitter_ratio: 0.0,
            max_reconnect_attempts: None,
        }
    }
}

impl BackoffPolicy {
    /// Un-jittered delay after `consecutive_failures` (>= 1) failed cycles.
    pub fn delay_for(&self, consecutive_failures: u32) -> Duration {
        let exponent = consecutive_failures.saturating_sub(1).min(64) as i32;
        let scaled = self.base_backoff_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = scaled.min(self.max_backoff_ms.max(self.base_backoff_ms) as f64);
        Duration::from_millis(capped as u64)
    }

    /// [`delay_for`](Self::delay_for) with jitter applied.
    pub fn jittered_delay<R: Rng + ?Sized>(&self, consecutive_failures: u32, rng: &mut R) -> Duration {
        let delay = self.delay_for(consecutive_failures);
        if self.jitter_ratio <= 0.0 {
            return delay;
        }

        let spread = rng.gen_range(-self.jitter_ratio..=self.jitter_ratio);
        delay.mul_f64((1.0 + spread).max(0.0))
    }

    /// Whether the circuit breaker has tripped
    pub fn exhausted(&self, consecutive_failures: u32) -> bool {
        self.max_reconnect_attempts
            .is_some_and(|max| consecutive_failures >= max)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base_backoff_ms == 0 {
            return Err("base_backoff_ms must be greater than 0".to_string());
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err("backoff_multiplier must be >= 1.0".to_string());
        }
        if !(0.0..1.0).contains(&self.jitter_ratio) {
            return Err("jitter_ratio must be in [0, 1)".to_string());
        }
        if self.max_reconnect_attempts == Some(0) {
            return Err("max_reconnect_attempts must be greater than 0 when set".to_string());
        }
        Ok(())
    }
}
