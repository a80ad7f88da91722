//! Reconnect policy.
//!
//! The transport never reconnects on its own; the client builds a fresh one
//! after each failure, waiting longer each time.

use std::time::Duration;

/// Maximum reconnection attempts before giving up.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Base delay between reconnection attempts (exponential backoff).
const RECONNECT_BASE_DELAY_SECS: u64 = 2;

/// Maximum delay between reconnection attempts.
const MAX_RECONNECT_DELAY_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::with_max_attempts(MAX_RECONNECT_ATTEMPTS)
    }
}

impl ReconnectPolicy {
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::from_secs(RECONNECT_BASE_DELAY_SECS),
            max_delay: Duration::from_secs(MAX_RECONNECT_DELAY_SECS),
        }
    }

    /// Whether failure number `attempt` (1-based) may be retried.
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt <= self.max_attempts
    }

    /// Exponential backoff delay before retry number `attempt`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(6);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}
