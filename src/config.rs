use std::{fmt, sync::Arc, time::Duration};

use crate::{error::ConfigError, timer::TimerHandle};

/// Tolerance added to every deadline unless configured otherwise.
pub const DEFAULT_LAG: Duration = Duration::from_millis(1000);

/// Largest delay a single raw timer is armed with (2^31 - 1 ms).
pub const MAX_DELAY: Duration = Duration::from_millis(i32::MAX as u64);

/// Computes the delay of the next raw timer after a late firing.
///
/// Receives the originally requested delay and the handle the caller holds.
pub type Rescheduler = Arc<dyn Fn(Duration, &TimerHandle) -> Duration + Send + Sync>;

#[derive(Clone)]
pub struct GuardConfig {
    lag: Duration,
    rescheduler: Option<Rescheduler>,
    event_capacity: Option<usize>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            lag: DEFAULT_LAG,
            rescheduler: None,
            event_capacity: None,
        }
    }
}

impl fmt::Debug for GuardConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardConfig")
            .field("lag", &self.lag)
            .field("rescheduler", &self.rescheduler.as_ref().map(|_| "custom"))
            .field("event_capacity", &self.event_capacity)
            .finish()
    }
}

impl GuardConfig {
    pub fn builder() -> GuardConfigBuilder {
        GuardConfigBuilder::default()
    }

    pub fn lag(&self) -> Duration {
        self.lag
    }

    pub fn event_capacity(&self) -> Option<usize> {
        self.event_capacity
    }

    pub fn has_rescheduler(&self) -> bool {
        self.rescheduler.is_some()
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.lag.is_zero() {
            return Err(ConfigError::ZeroLag);
        }
        if self.lag > MAX_DELAY {
            return Err(ConfigError::LagTooLarge {
                lag: self.lag,
                max: MAX_DELAY,
            });
        }
        if self.event_capacity == Some(0) {
            return Err(ConfigError::ZeroEventCapacity);
        }
        Ok(())
    }

    /// Delay for the raw timer that replaces a late one.
    pub(crate) fn reschedule_delay(&self, requested: Duration, handle: &TimerHandle) -> Duration {
        match &self.rescheduler {
            Some(rescheduler) => rescheduler(requested, handle).min(MAX_DELAY),
            None => requested,
        }
    }
}

#[derive(Default, Clone)]
pub struct GuardConfigBuilder {
    config: GuardConfig,
}

impl GuardConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lag(&mut self, lag: Duration) -> &mut Self {
        self.config.lag = lag;
        self
    }

    pub fn with_lag_millis(&mut self, lag_ms: u64) -> &mut Self {
        self.with_lag(Duration::from_millis(lag_ms))
    }

    /// Sets the delay used for the raw timer that replaces a late one.
    ///
    /// The on-time deadline of a re-armed timer is still `requested + lag`
    /// from the rearm, so a rescheduler returning more than that makes every
    /// firing late and the callback never runs.
    pub fn with_rescheduler<F>(&mut self, rescheduler: F) -> &mut Self
    where
        F: Fn(Duration, &TimerHandle) -> Duration + Send + Sync + 'static,
    {
        self.config.rescheduler = Some(Arc::new(rescheduler));
        self
    }

    /// Publish [`TimerEvent`](crate::TimerEvent)s on a channel holding up to `capacity` events.
    pub fn with_events(&mut self, capacity: usize) -> &mut Self {
        self.config.event_capacity = Some(capacity);
        self
    }

    /// Validation happens in [`GuardedScheduler::create`](crate::GuardedScheduler::create).
    pub fn build(&self) -> GuardConfig {
        self.config.clone()
    }
}
