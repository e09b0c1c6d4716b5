use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Shared handle to a caller-supplied error. Cloning keeps the same instance.
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// The deadline of a condition poll elapsed without a truthy result.
#[derive(Debug, Clone, Error)]
pub enum ConditionTimeoutError {
    #[error("Condition unmet after {waited_ms} ms. Timing out.")]
    Elapsed { waited_ms: u64 },

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Custom(SharedError),
}

impl ConditionTimeoutError {
    /// Returns the caller-supplied error instance, if the timeout was overridden with one.
    pub fn custom(&self) -> Option<&SharedError> {
        match self {
            Self::Custom(err) => Some(err),
            _ => None,
        }
    }
}

/// Failure of [`wait_for_condition`](crate::wait_for_condition).
///
/// `Condition` carries the predicate's own error untouched, so callers can
/// tell a failed evaluation apart from an exhausted time budget by variant.
#[derive(Debug, Error)]
pub enum PollError<E> {
    #[error(transparent)]
    Timeout(#[from] ConditionTimeoutError),

    #[error(transparent)]
    Condition(E),
}

impl<E> PollError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub fn into_condition_error(self) -> Option<E> {
        match self {
            Self::Condition(err) => Some(err),
            Self::Timeout(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum InteropError {
    #[error("No function registered under name '{0}'")]
    UnknownFunction(String),
}
