//! Future helpers for tokio: sleeping, retrying, bounded condition polling,
//! concurrent map/filter and callback interop.

pub mod core;

pub use crate::core::callback::{asyncify, nodeify, CallbackRegistry};
pub use crate::core::collection::{async_filter, async_map, parallel};
pub use crate::core::error::{ConditionTimeoutError, InteropError, PollError, SharedError};
pub use crate::core::logger::{MemoryLogger, PollLogger, TracingLogger};
pub use crate::core::poll::{
    duration_ms, wait_for, wait_for_condition, PollConfig, TimeoutOverride, DEFAULT_INTERVAL,
    DEFAULT_WAIT,
};
pub use crate::core::retry::{retry, retry_interval, RetryState};
pub use crate::core::settings::{LogFormat, Settings};
pub use crate::core::sleep::{sleep, sleep_ms};
pub use crate::core::truthy::Truthy;
