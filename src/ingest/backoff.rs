//! Capped exponential retry delays

use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug)]
pub struct RetryBudgetExhausted;

impl std::fmt::Display for RetryBudgetExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "retry budget exhausted")
    }
}

impl std::error::Error for RetryBudgetExhausted {}

#[derive(Debug)]
pub struct ExponentialBackoff {
    base_delay_ms: u64,
    max_delay_ms: u64,
    max_attempts: u32,
    attempt: u32,
}

impl ExponentialBackoff {
    pub fn new(base_delay_ms: u64, max_delay_ms: u64, max_attempts: u32) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms,
            max_attempts,
            attempt: 0,
        }
    }

    /// Wait for the next delay in the schedule, or report that the budget
    /// is spent.
    pub async fn sleep(&mut self) -> Result<(), RetryBudgetExhausted> {
        if self.attempt >= self.max_attempts {
            return Err(RetryBudgetExhausted);
        }
        let delay = self
            .base_delay_ms
            .saturating_mul(1u64 << self.attempt.min(20))
            .min(self.max_delay_ms);
        self.attempt += 1;

        log::warn!(
            "⏳ Retry {}/{} in {}ms",
            self.attempt,
            self.max_attempts,
            delay
        );
        sleep(Duration::from_millis(delay)).await;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
