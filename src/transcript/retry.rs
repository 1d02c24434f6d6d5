//! Retry with exponential backoff for a single strategy.

use super::classify::classify_failure;
use crate::config::TranscriptSettings;
use crate::error::Result;
use crate::video::VideoReference;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Bounded retry policy; delays double after each failed attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
        }
    }

    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn from_settings(settings: &TranscriptSettings) -> Self {
        Self::new(
            settings.max_attempts,
            Duration::from_millis(settings.initial_backoff_ms),
        )
    }

    /// Delay before attempt `attempt + 1`, where `attempt` is 1-based.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }

    /// Run `op` for `video` until it succeeds, fails with a non-transient
    /// error, or the attempt budget is spent. The last error is returned.
    pub async fn run<T, F, Fut>(&self, label: &str, video: &VideoReference, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let category = classify_failure(&e, video);
                    if !category.is_transient() || attempt >= self.max_attempts {
                        debug!(%label, attempt, %category, "giving up: {}", e);
                        return Err(e);
                    }

                    let delay = self.backoff_for(attempt);
                    warn!(
                        "{} attempt {}/{} failed ({}), retrying in {:?}",
                        label, attempt, self.max_attempts, category, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}
