//! Bounded exponential backoff with jitter.

use std::time::Duration;
use rand::Rng;

/// Delay schedule for repeated polls: doubles from `base` up to `max`,
/// with up to 10% jitter that never pushes a delay past `max`.
#[derive(Debug, Clone)]
pub struct PollBackoff {
    base_ms: u64,
    max_ms: u64,
    attempt: u32,
}

impl PollBackoff {
    /// Create a schedule starting at `base_ms` and capped at `max_ms`.
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_ms,
            max_ms: max_ms.max(base_ms),
            attempt: 0,
        }
    }

    /// Delay before the next poll.
    pub fn next_delay(&mut self) -> Duration {
        let exponential = 2u64.saturating_pow(self.attempt);
        let capped = self.base_ms.saturating_mul(exponential).min(self.max_ms);
        self.attempt = self.attempt.saturating_add(1);

        let jitter_range = capped / 10;
        let jitter = if jitter_range > 0 {
            rand::thread_rng().gen_range(0..jitter_range)
        } else {
            0
        };

        Duration::from_millis(capped.saturating_add(jitter).min(self.max_ms))
    }

    /// Number of delays handed out so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}
