use crate::core::error::{ConditionTimeoutError, PollError, SharedError};
use crate::core::logger::PollLogger;
use crate::core::truthy::Truthy;
use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_WAIT: Duration = Duration::from_millis(5000);
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// What a timed-out poll fails with.
#[derive(Clone, Default)]
pub enum TimeoutOverride {
    /// Report how long the poll waited.
    #[default]
    None,
    /// Fail with exactly this message.
    Message(String),
    /// Fail with this error instance.
    Cause(SharedError),
}

impl TimeoutOverride {
    fn into_error(self, waited: Duration) -> ConditionTimeoutError {
        match self {
            Self::None => ConditionTimeoutError::Elapsed {
                waited_ms: duration_ms(waited),
            },
            Self::Message(message) => ConditionTimeoutError::Message(message),
            Self::Cause(err) => ConditionTimeoutError::Custom(err),
        }
    }
}

impl fmt::Debug for TimeoutOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Message(message) => f.debug_tuple("Message").field(message).finish(),
            Self::Cause(err) => f.debug_tuple("Cause").field(&err.to_string()).finish(),
        }
    }
}

impl From<&str> for TimeoutOverride {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl From<String> for TimeoutOverride {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<SharedError> for TimeoutOverride {
    fn from(err: SharedError) -> Self {
        Self::Cause(err)
    }
}

#[derive(Clone)]
pub struct PollConfig {
    /// Total time budget, measured from the first evaluation.
    pub wait: Duration,
    /// Pause between evaluations, clamped to the remaining budget.
    pub interval: Duration,
    pub error: TimeoutOverride,
    pub logger: Option<Arc<dyn PollLogger>>,
}

impl PollConfig {
    pub fn new() -> Self {
        Self {
            wait: DEFAULT_WAIT,
            interval: DEFAULT_INTERVAL,
            error: TimeoutOverride::None,
            logger: None,
        }
    }

    pub fn wait(mut self, wait: Duration) -> Self {
        self.wait = wait;
        self
    }

    pub fn wait_ms(self, ms: u64) -> Self {
        self.wait(Duration::from_millis(ms))
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval_ms(self, ms: u64) -> Self {
        self.interval(Duration::from_millis(ms))
    }

    pub fn error(mut self, error: impl Into<TimeoutOverride>) -> Self {
        self.error = error.into();
        self
    }

    pub fn error_cause<E>(self, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.error(TimeoutOverride::Cause(Arc::new(err)))
    }

    pub fn logger(mut self, logger: Arc<dyn PollLogger>) -> Self {
        self.logger = Some(logger);
        self
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PollConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollConfig")
            .field("wait", &self.wait)
            .field("interval", &self.interval)
            .field("error", &self.error)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

/// Evaluates `condition` until it yields a truthy value or `config.wait` elapses.
///
/// The first evaluation happens immediately. Between evaluations the task
/// sleeps `min(interval, end_at - now)`, so no sleep crosses the deadline.
/// A failed evaluation is returned at once as [`PollError::Condition`]; an
/// exhausted budget as [`PollError::Timeout`].
pub async fn wait_for_condition<F, Fut, R, E>(
    mut condition: F,
    config: &PollConfig,
) -> Result<R, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, E>>,
    R: Truthy,
{
    let begun_at = Instant::now();
    // `None` when the budget lies beyond what the clock can represent.
    let end_at = begun_at.checked_add(config.wait);

    loop {
        let result = condition().await.map_err(PollError::Condition)?;
        if result.is_truthy() {
            return Ok(result);
        }

        let now = Instant::now();
        let waited = now.duration_since(begun_at);
        let pause = match end_at {
            Some(end_at) if now >= end_at => {
                return Err(config.error.clone().into_error(waited).into());
            }
            Some(end_at) => config.interval.min(end_at - now),
            None => config.interval,
        };

        if let Some(logger) = &config.logger {
            logger.debug(&format!("Waited for {} ms so far", duration_ms(waited)));
        }

        tokio::time::sleep(pause).await;
    }
}

/// [`wait_for_condition`] for a synchronous predicate that cannot fail.
pub async fn wait_for<F, R>(mut condition: F, config: &PollConfig) -> Result<R, ConditionTimeoutError>
where
    F: FnMut() -> R,
    R: Truthy,
{
    let polled = wait_for_condition(
        || std::future::ready(Ok::<R, Infallible>(condition())),
        config,
    )
    .await;

    match polled {
        Ok(value) => Ok(value),
        Err(PollError::Timeout(err)) => Err(err),
        Err(PollError::Condition(never)) => match never {},
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::logger::MemoryLogger;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};

    const SLACK: Duration = Duration::from_millis(2);

    #[test]
    fn test_default_config() {
        let config = PollConfig::default();
        assert_eq!(config.wait, Duration::from_millis(5000));
        assert_eq!(config.interval, Duration::from_millis(500));
        assert!(matches!(config.error, TimeoutOverride::None));
        assert!(config.logger.is_none());
    }

    #[test]
    fn test_duration_ms_saturates() {
        assert_eq!(duration_ms(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_ms(Duration::from_micros(999)), 0);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_wait_resolves_on_first_evaluation() {
        let config = PollConfig::new().wait(Duration::MAX).interval_ms(1);

        assert_eq!(wait_for(|| 7u8, &config).await.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_wait_sleeps_full_interval() {
        let start = Instant::now();
        let mut evaluations = Vec::new();
        let config = PollConfig::new().wait(Duration::MAX).interval_ms(10);

        let value = wait_for(
            || {
                evaluations.push(start.elapsed());
                (evaluations.len() >= 4).then_some(evaluations.len())
            },
            &config,
        )
        .await
        .unwrap();

        assert_eq!(value, Some(4));
        for pair in evaluations.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(10), "{evaluations:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_and_succeed() {
        let start = Instant::now();
        let config = PollConfig::new().wait_ms(1000).interval_ms(10);

        let result = wait_for(|| start.elapsed() > Duration::from_millis(200), &config).await;

        assert!(result.unwrap());
        let duration = start.elapsed();
        assert!(duration > Duration::from_millis(200), "{duration:?}");
        assert!(duration < Duration::from_millis(250), "{duration:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_and_fail() {
        let start = Instant::now();
        let config = PollConfig::new().wait_ms(100).interval_ms(10);

        let err = wait_for(|| start.elapsed() > Duration::from_millis(200), &config)
            .await
            .unwrap_err();

        assert!(matches!(err, ConditionTimeoutError::Elapsed { .. }));
        assert!(err.to_string().starts_with("Condition unmet after"));
        assert!(start.elapsed() <= Duration::from_millis(100) + SLACK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_wait_times_out_on_first_evaluation() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let config = PollConfig::new().wait(Duration::ZERO).interval_ms(50);

        let err = wait_for(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                false
            },
            &config,
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(err.to_string(), "Condition unmet after 0 ms. Timing out.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_with_the_truthy_value() {
        let mut calls = 0u32;
        let config = PollConfig::new().wait_ms(1000).interval_ms(10);

        let found = wait_for(
            || {
                calls += 1;
                (calls >= 3).then(|| format!("port-{}", 8000 + calls))
            },
            &config,
        )
        .await
        .unwrap();

        assert_eq!(found, Some("port-8003".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_sleep_is_clamped_to_deadline() {
        let start = Instant::now();
        let mut evaluations = Vec::new();
        let config = PollConfig::new().wait_ms(25).interval_ms(10);

        let result = wait_for(
            || {
                evaluations.push(start.elapsed());
                false
            },
            &config,
        )
        .await;

        assert!(result.is_err());
        assert!(evaluations.len() >= 4, "{evaluations:?}");
        assert_eq!(evaluations[0], Duration::ZERO);

        let deadline = Duration::from_millis(25);
        for pair in evaluations.windows(2) {
            let remaining = deadline.saturating_sub(pair[0]);
            assert!(pair[1] - pair[0] <= remaining + SLACK, "{evaluations:?}");
        }
        let last = *evaluations.last().unwrap();
        assert!(last >= deadline && last <= deadline + SLACK, "{last:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_message() {
        let config = PollConfig::new().wait_ms(30).interval_ms(10).error("custom");

        let err = wait_for(|| false, &config).await.unwrap_err();

        assert!(matches!(err, ConditionTimeoutError::Message(_)));
        assert_eq!(err.to_string(), "custom");
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_error_is_same_instance() {
        let cause: SharedError = Arc::new(io::Error::new(io::ErrorKind::TimedOut, "device never came up"));
        let config = PollConfig::new()
            .wait_ms(30)
            .interval_ms(10)
            .error(Arc::clone(&cause));

        let err = wait_for(|| 0u32, &config).await.unwrap_err();

        assert!(Arc::ptr_eq(err.custom().unwrap(), &cause));
        assert_eq!(err.to_string(), "device never came up");
    }

    #[tokio::test(start_paused = true)]
    async fn test_condition_error_propagates_immediately() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();
        let config = PollConfig::new().wait_ms(1000).interval_ms(10);

        let err = wait_for_condition(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<bool, _>(io::Error::new(io::ErrorKind::Other, "boom")) }
            },
            &config,
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        match err {
            PollError::Condition(inner) => assert_eq!(inner.to_string(), "boom"),
            PollError::Timeout(e) => panic!("expected condition error, got timeout: {e}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_condition_error_after_falsy_results() {
        let mut calls = 0u32;
        let config = PollConfig::new().wait_ms(1000).interval_ms(10);

        let err = wait_for_condition(
            || {
                calls += 1;
                let current = calls;
                async move {
                    if current < 3 {
                        Ok(false)
                    } else {
                        Err("lost connection")
                    }
                }
            },
            &config,
        )
        .await
        .unwrap_err();

        assert_eq!(calls, 3);
        assert!(matches!(err, PollError::Condition("lost connection")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_condition() {
        let start = Instant::now();
        let config = PollConfig::new().wait_ms(500).interval_ms(20);

        let value = wait_for_condition(
            || async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok::<_, Infallible>(start.elapsed() >= Duration::from_millis(60))
            },
            &config,
        )
        .await
        .unwrap();

        assert!(value);
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_logger_receives_non_terminal_iterations() {
        let logger = MemoryLogger::new();
        let config = PollConfig::new()
            .wait_ms(25)
            .interval_ms(10)
            .logger(Arc::new(logger.clone()));

        let mut calls = 0usize;
        let _ = wait_for(
            || {
                calls += 1;
                false
            },
            &config,
        )
        .await;

        let lines = logger.lines();
        assert_eq!(lines.len(), calls - 1);
        assert_eq!(lines[0], "Waited for 0 ms so far");
        assert!(lines
            .iter()
            .all(|line| line.starts_with("Waited for ") && line.ends_with(" ms so far")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_log_when_first_evaluation_succeeds() {
        let logger = MemoryLogger::new();
        let config = PollConfig::new().logger(Arc::new(logger.clone()));

        assert_eq!(wait_for(|| 42u8, &config).await.unwrap(), 42);
        assert!(logger.lines().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_polls_are_independent() {
        let start = Instant::now();
        let short = PollConfig::new().wait_ms(50).interval_ms(10);
        let long = PollConfig::new().wait_ms(500).interval_ms(10);

        let (fast, slow) = tokio::join!(
            wait_for(|| start.elapsed() >= Duration::from_millis(100), &short),
            wait_for(|| start.elapsed() >= Duration::from_millis(100), &long),
        );

        assert!(fast.is_err());
        assert!(slow.unwrap());
    }
}
