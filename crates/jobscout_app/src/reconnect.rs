//! What to do after the push channel fails.

use std::time::Duration;

pub trait ReconnectPolicy: Send {
    /// Delay before reopening after `attempt` consecutive failures, counting from 1.
    /// `None` gives up and leaves the session idle until an explicit `open`.
    fn next_delay(&mut self, attempt: u32) -> Option<Duration>;
}

/// Never reopens on its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverReconnect;

impl ReconnectPolicy for NeverReconnect {
    fn next_delay(&mut self, _attempt: u32) -> Option<Duration> {
        None
    }
}

/// Doubles the delay after each failure, up to `max`, for at most `max_attempts` tries.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub initial: Duration,
    pub max: Duration,
    pub max_attempts: u32,
}

impl ReconnectPolicy for ExponentialBackoff {
    fn next_delay(&mut self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        Some(self.initial.saturating_mul(factor).min(self.max))
    }
}
