use std::thread;
use std::time::Duration;

use docchat_core::config::RetrySettings;
use docchat_core::error::AppError;
use tracing::warn;

/// Bounded exponential backoff for provider calls.
///
/// Only errors flagged `retryable` are retried; everything else is returned on first sight.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(s: &RetrySettings) -> Self {
        Self {
            max_attempts: s.max_attempts.max(1),
            initial_delay: Duration::from_millis(s.initial_delay_ms),
            max_delay: Duration::from_millis(s.max_delay_ms),
            multiplier: s.multiplier.max(1.0),
        }
    }
}

impl RetryPolicy {
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Delay slept after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.powi(attempt.saturating_sub(1) as i32);
        let ms = (self.initial_delay.as_millis() as f64 * factor).min(self.max_delay.as_millis() as f64);
        Duration::from_millis(ms.max(0.0).round() as u64)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or attempts run out.
    ///
    /// Returns the last error unchanged; callers decide how exhaustion is reported.
    pub fn run<T, F>(&self, label: &str, mut op: F) -> Result<T, AppError>
    where
        F: FnMut() -> Result<T, AppError>,
    {
        let mut attempt = 1u32;
        loop {
            match op() {
                Ok(v) => return Ok(v),
                Err(e) if e.retryable && attempt < self.max_attempts => {
                    let delay = self.delay_after(attempt);
                    warn!(
                        op = label,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        err = %e,
                        "retrying after transient failure"
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Turn an error that survived the retry loop into the caller's terminal error code.
///
/// Auth failures keep their own code so callers can prompt for a new key.
pub(crate) fn exhausted(err: AppError, failed_code: &str, message: &str, attempts: u32) -> AppError {
    if err.code.starts_with("AI_AUTH_") || err.code == failed_code {
        return err;
    }
    AppError::new(failed_code, message).with_details(format!("attempts={attempts}; last={err}"))
}
