//! Retry handler for step invocations.
//!
//! Stateless: all logic lives in associated functions that take the step's
//! `RetryPolicy` as a parameter. `attempt` is 1-based (the first invocation
//! is attempt 1).

use std::time::Duration;

use skillflow_types::skill::{RetryBackoff, RetryPolicy};

/// Stateless retry handler for step failures.
pub struct RetryHandler;

impl RetryHandler {
    /// Total attempts allowed by `policy`. Zero is treated as one.
    pub fn max_attempts(policy: Option<&RetryPolicy>) -> u32 {
        policy.map_or(1, |p| p.max_attempts.max(1))
    }

    /// Whether another attempt should follow failed attempt number `attempt`.
    pub fn should_retry(policy: Option<&RetryPolicy>, attempt: u32) -> bool {
        attempt < Self::max_attempts(policy)
    }

    /// Delay to wait after failed attempt number `attempt` before the next one.
    ///
    /// Fixed backoff waits `delay_ms` every time. Exponential backoff doubles
    /// it per attempt, capped by `max_delay_ms` when set.
    pub fn delay_for_attempt(policy: Option<&RetryPolicy>, attempt: u32) -> Duration {
        let Some(policy) = policy else {
            return Duration::ZERO;
        };

        let ms = match policy.backoff {
            RetryBackoff::Fixed => policy.delay_ms,
            RetryBackoff::Exponential => {
                let exponent = attempt.saturating_sub(1).min(32);
                policy.delay_ms.saturating_mul(1u64 << exponent)
            }
        };

        let capped = policy.max_delay_ms.map_or(ms, |cap| ms.min(cap));
        Duration::from_millis(capped)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
