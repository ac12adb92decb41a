//! Bounded retry for polling external job state.

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

/// Why [`RetryPolicy::execute`] gave up. Every variant carries the last
/// failure of the wrapped operation.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: E,
    },

    #[error("gave up after {elapsed:?}: {source}")]
    TimedOut {
        elapsed: Duration,
        #[source]
        source: E,
    },

    /// Returned on the first failure when the policy is in passthrough mode.
    #[error(transparent)]
    Passthrough(E),
}

impl<E> RetryError<E> {
    pub fn into_source(self) -> E {
        match self {
            Self::Exhausted { source, .. }
            | Self::TimedOut { source, .. }
            | Self::Passthrough(source) => source,
        }
    }
}

/// Retry limits and pacing.
///
/// `max_attempts` and `max_duration` are both optional; when both are `None`
/// the operation is retried until it succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: Option<u32>,
    pub max_duration: Option<Duration>,
    pub delay: Duration,
    /// Surface the first failure unchanged instead of retrying.
    pub passthrough: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            max_duration: Some(Duration::from_secs(10 * 60)),
            delay: Duration::from_secs(5),
            passthrough: false,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_max_duration(mut self, max_duration: Option<Duration>) -> Self {
        self.max_duration = max_duration;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn passthrough(mut self) -> Self {
        self.passthrough = true;
        self
    }

    /// Runs `operation` until it succeeds or a limit is reached, sleeping
    /// `delay` between attempts.
    pub fn execute<T, E, F>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: std::fmt::Display,
    {
        let start = Instant::now();
        let mut attempts = 0_u32;

        loop {
            let error = match operation() {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if self.passthrough {
                return Err(RetryError::Passthrough(error));
            }

            attempts = attempts.saturating_add(1);
            if self.max_attempts.is_some_and(|max| attempts >= max) {
                warn!(attempts, "retry attempts exhausted: {error}");
                return Err(RetryError::Exhausted {
                    attempts,
                    source: error,
                });
            }

            let elapsed = start.elapsed();
            if self.max_duration.is_some_and(|max| elapsed >= max) {
                warn!(?elapsed, "retry time limit reached: {error}");
                return Err(RetryError::TimedOut {
                    elapsed,
                    source: error,
                });
            }

            debug!(attempts, delay = ?self.delay, "attempt failed, retrying: {error}");
            std::thread::sleep(self.delay);
        }
    }
}
