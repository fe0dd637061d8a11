// src/api/retry.rs
// =============================================================================
// Back-off policy for rate-limited requests.
//
// When the API throttles us it says how long to wait (retry_after). We wait
// that long plus a back-off that grows by a fixed step on every attempt, so
// repeated throttling puts less and less pressure on the server:
//
//   attempt 1: retry_after + 100ms
//   attempt 2: retry_after + 200ms
//   ...
//   capped:    retry_after + 5s
//
// The back-off is per call: every new target starts again from zero.
// =============================================================================

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first request before giving up on a target
    pub max_retries: u32,
    /// Amount added to the back-off on every retry
    pub backoff_step: Duration,
    /// Upper bound for the back-off (not for the server's retry_after)
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 8,
            backoff_step: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Back-off to use after `current`
    pub fn next_backoff(&self, current: Duration) -> Duration {
        (current + self.backoff_step).min(self.max_backoff)
    }

    /// Total pause before retrying: the server's retry_after plus our back-off
    ///
    /// Negative or NaN values from the server count as zero; values too large
    /// for a Duration saturate instead of panicking.
    pub fn delay(&self, retry_after_secs: f64, backoff: Duration) -> Duration {
        let server = if retry_after_secs > 0.0 {
            Duration::try_from_secs_f64(retry_after_secs).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        server.saturating_add(backoff)
    }
}
