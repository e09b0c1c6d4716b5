use std::future::Future;
use std::time::Duration;

/// Attempt bookkeeping for a bounded retry.
#[derive(Debug, Clone)]
pub struct RetryState {
    times: u32,
    attempts: u32,
}

impl RetryState {
    /// `times` is clamped to at least one attempt.
    pub fn new(times: u32) -> Self {
        Self {
            times: times.max(1),
            attempts: 0,
        }
    }

    pub fn record_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn times(&self) -> u32 {
        self.times
    }

    pub fn has_attempts_left(&self) -> bool {
        self.attempts < self.times
    }
}

impl Default for RetryState {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Runs `operation` until it succeeds, at most `times` times.
///
/// Returns the first success, or the error of the final attempt.
pub async fn retry<F, Fut, T, E>(times: u32, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_interval(times, Duration::ZERO, operation).await
}

/// Like [`retry`], sleeping `interval` after every failed attempt but the last.
pub async fn retry_interval<F, Fut, T, E>(
    times: u32,
    interval: Duration,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut state = RetryState::new(times);

    loop {
        state.record_attempt();
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !state.has_attempts_left() => return Err(err),
            Err(_) => {
                tracing::debug!(
                    attempt = state.attempts(),
                    times = state.times(),
                    "Attempt failed, retrying"
                );
                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }
}
