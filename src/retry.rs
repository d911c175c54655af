//! Capped retry policy with exponential backoff and multiplicative jitter.
//!
//! Used only by the extraction glue (VLM calls and JSON validation); the
//! detection/splitting core never retries — a failed page degrades to
//! "no match" and a failed document is skipped.
//!
//! ## Why jitter?
//!
//! With several sections in flight, a provider hiccup fails them all at the
//! same instant. Identical backoff schedules would retry them in lockstep and
//! hammer a recovering endpoint. Multiplying each delay by a random factor in
//! `[0.5, 1.5)` spreads the retries out. The jitter application is a pure
//! function of `(attempt, factor)` so tests can pin the factor.

use rand::Rng;
use std::time::Duration;

/// Backoff schedule for retrying a fallible operation.
///
/// Attempt numbering is 0-based: attempt 0 is the initial try and is never
/// delayed; attempt `n > 0` waits `base_delay * multiplier^(n-1) * jitter`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first (so `5` means 1 try + 4 retries).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Growth factor between consecutive retries.
    pub multiplier: f64,
    /// Half-open jitter window; each delay is scaled by a uniform sample
    /// from `[jitter_min, jitter_max)`.
    pub jitter_min: f64,
    pub jitter_max: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            jitter_min: 0.5,
            jitter_max: 1.5,
        }
    }
}

impl RetryPolicy {
    /// A policy that tries exactly once (no retries, no delays).
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            multiplier: 1.0,
            jitter_min: 1.0,
            jitter_max: 1.0,
        }
    }

    /// Whether `attempt` (0-based) is within the policy's budget.
    pub fn allows(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Deterministic core: the delay before `attempt`, scaled by `factor`.
    ///
    /// Returns `Duration::ZERO` for attempt 0.
    pub fn delay_with_factor(&self, attempt: u32, factor: f64) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exp = self.multiplier.powi(attempt as i32 - 1);
        self.base_delay.mul_f64(exp * factor.max(0.0))
    }

    /// Sample a jittered delay for `attempt`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = if self.jitter_max > self.jitter_min {
            rand::thread_rng().gen_range(self.jitter_min..self.jitter_max)
        } else {
            self.jitter_min
        };
        self.delay_with_factor(attempt, factor)
    }

    /// Sleep for the jittered delay before `attempt` (no-op for attempt 0).
    pub async fn wait(&self, attempt: u32) {
        let d = self.delay(attempt);
        if !d.is_zero() {
            tokio::time::sleep(d).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_is_immediate() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay_with_factor(0, 1.0), Duration::ZERO);
    }

    #[test]
    fn backoff_doubles_without_jitter() {
        let p = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
            multiplier: 2.0,
            jitter_min: 1.0,
            jitter_max: 1.0,
        };
        assert_eq!(p.delay_with_factor(1, 1.0), Duration::from_millis(500));
        assert_eq!(p.delay_with_factor(2, 1.0), Duration::from_millis(1000));
        assert_eq!(p.delay_with_factor(3, 1.0), Duration::from_millis(2000));
    }

    #[test]
    fn jitter_scales_linearly() {
        let p = RetryPolicy::default();
        let lo = p.delay_with_factor(2, 0.5);
        let hi = p.delay_with_factor(2, 1.5);
        assert_eq!(lo, Duration::from_secs(1));
        assert_eq!(hi, Duration::from_secs(3));
    }

    #[test]
    fn sampled_delay_stays_in_window() {
        let p = RetryPolicy::default();
        for _ in 0..100 {
            let d = p.delay(1);
            assert!(d >= Duration::from_millis(500), "below jitter window: {d:?}");
            assert!(d < Duration::from_millis(1500), "above jitter window: {d:?}");
        }
    }

    #[test]
    fn attempt_budget() {
        let p = RetryPolicy::default();
        assert!(p.allows(0));
        assert!(p.allows(4));
        assert!(!p.allows(5));

        let once = RetryPolicy::none();
        assert!(once.allows(0));
        assert!(!once.allows(1));
        assert_eq!(once.delay_with_factor(1, 1.0), Duration::ZERO);
    }

    #[test]
    fn negative_factor_clamps_to_zero() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay_with_factor(3, -1.0), Duration::ZERO);
    }
}
