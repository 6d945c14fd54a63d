//! Retry policies.

use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::error::PlumeError;

/// Decides whether a retryable failure is attempted again.
///
/// A fresh retryer is cloned from the configured prototype for every
/// invocation, so implementations may keep per-call state.
pub trait Retryer: Send + Sync {
    /// Return `Ok(())` to try again (after sleeping as needed), or the error
    /// to give up with.
    fn continue_or_propagate(&mut self, error: PlumeError) -> Result<(), PlumeError>;

    fn clone_box(&self) -> Box<dyn Retryer>;
}

/// Exponential backoff with a cap on attempts.
#[derive(Debug, Clone)]
pub struct DefaultRetryer {
    period: Duration,
    max_period: Duration,
    max_attempts: u32,
    attempt: u32,
}

impl DefaultRetryer {
    pub fn new(period: Duration, max_period: Duration, max_attempts: u32) -> Self {
        Self {
            period,
            max_period,
            max_attempts,
            attempt: 1,
        }
    }

    /// Backoff before the next attempt: `period * 1.5^(attempt-1)`, capped.
    fn next_max_interval(&self) -> Duration {
        let multiplier = 1.5_f64.powi(self.attempt.saturating_sub(1) as i32);
        self.period.mul_f64(multiplier).min(self.max_period)
    }
}

impl Default for DefaultRetryer {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(1), 5)
    }
}

impl Retryer for DefaultRetryer {
    fn continue_or_propagate(&mut self, error: PlumeError) -> Result<(), PlumeError> {
        let retry_after = match &error {
            PlumeError::Retryable { retry_after, .. } => *retry_after,
            _ => return Err(error),
        };
        if self.attempt >= self.max_attempts {
            return Err(error);
        }
        let interval = match retry_after {
            Some(delay) => delay.min(self.max_period),
            None => self.next_max_interval(),
        };
        self.attempt += 1;
        debug!(attempt = self.attempt, ?interval, "retrying after {error}");
        thread::sleep(interval);
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Retryer> {
        Box::new(Self::new(self.period, self.max_period, self.max_attempts))
    }
}

/// Never retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetry;

impl Retryer for NeverRetry {
    fn continue_or_propagate(&mut self, error: PlumeError) -> Result<(), PlumeError> {
        Err(error)
    }

    fn clone_box(&self) -> Box<dyn Retryer> {
        Box::new(NeverRetry)
    }
}
