use std::time::Duration;

use thiserror::Error;

use crate::task::TimerId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("lag tolerance {lag:?} exceeds the maximum timer delay {max:?}")]
    LagTooLarge { lag: Duration, max: Duration },
    #[error("lag tolerance must be greater than zero")]
    ZeroLag,
    #[error("event channel capacity must be greater than zero")]
    ZeroEventCapacity,
}

/// Returned by [`GuardedSleep`](crate::GuardedSleep) when its timer was cancelled.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("guarded timer {0} was cancelled before it fired")]
pub struct Cancelled(pub TimerId);
