//! Redelivery delay for requeued tasks.

use std::time::Duration;

use crate::models::Task;

/// Exponential backoff: `base_delay * multiplier^(attempts - 1)`, capped.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            multiplier: 2,
            max_delay: Duration::from_secs(3600),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next delivery, `attempts` being the deliveries so far.
    ///
    /// With the default policy: 2s, 4s, 8s, 16s, ...
    pub fn next_delay(&self, attempts: u32) -> Duration {
        let exponent = attempts.saturating_sub(1);
        self.multiplier
            .checked_pow(exponent)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Redelivery delay for this task; zero when it opted out of backoff.
    pub fn delay_for(&self, task: &Task) -> Duration {
        if task.no_exp_backoff {
            Duration::ZERO
        } else {
            self.next_delay(task.attempts)
        }
    }
}
