// Retry with exponential backoff for chain service calls

use crate::error::{MinerError, ServiceError};
use std::future::Future;
use std::time::Duration;

/// Backoff schedule for retrying service calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first failure; 0 means fail immediately
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based), doubling each time
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .map_or(self.max_backoff, |delay| delay.min(self.max_backoff))
    }

    /// Run `op` until it succeeds, fails permanently or retries run out
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, MinerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let mut retry = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && retry < self.max_retries => {
                    let delay = self.backoff(retry);
                    log::warn!(
                        "{} failed: {} (retry {}/{} in {:?})",
                        what,
                        e,
                        retry + 1,
                        self.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(source) => {
                    return Err(MinerError::Service {
                        attempts: retry + 1,
                        source,
                    });
                }
            }
        }
    }
}
