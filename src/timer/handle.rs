use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::time::Instant;

use crate::{
    scheduler::SchedulerCore,
    task::TimerId,
    timer::{
        TimerEvent,
        clock::{self, Deadline},
        raw::RawTimer,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// A raw timer is live and the callback has not run.
    Armed,
    Fired,
    Cancelled,
}

/// Mutable state of one guarded wait, possibly spanning several raw timers.
pub(crate) struct ActiveTimer {
    pub(crate) raw: Option<RawTimer>,
    pub(crate) deadline: Deadline,
    pub(crate) requested: Duration,
    pub(crate) state: TimerState,
    pub(crate) rearms: u32,
}

pub(crate) struct TimerShared {
    pub(crate) id: TimerId,
    pub(crate) core: Arc<SchedulerCore>,
    active: Mutex<ActiveTimer>,
}

impl TimerShared {
    pub(crate) fn new(id: TimerId, requested: Duration, core: Arc<SchedulerCore>) -> Self {
        let deadline = Deadline::after(clock::now(), requested, core.config.lag());
        Self {
            id,
            core,
            active: Mutex::new(ActiveTimer {
                raw: None,
                deadline,
                requested,
                state: TimerState::Armed,
                rearms: 0,
            }),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ActiveTimer> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Caller-facing handle of a guarded timer.
///
/// The handle stays valid across rearms: cancelling it or toggling its
/// keep-alive flag always reaches whichever raw timer is currently live.
/// Clones refer to the same timer and compare equal.
#[derive(Clone)]
pub struct TimerHandle {
    shared: Arc<TimerShared>,
}

impl TimerHandle {
    pub(crate) fn new(shared: Arc<TimerShared>) -> Self {
        Self { shared }
    }

    pub fn id(&self) -> TimerId {
        self.shared.id
    }

    /// Stops the timer for good; the callback will never run afterwards.
    ///
    /// Cancelling a timer that already fired or was cancelled is a no-op.
    pub fn cancel(&self) {
        let mut active = self.shared.lock();
        if active.state != TimerState::Armed {
            return;
        }
        active.state = TimerState::Cancelled;
        if let Some(raw) = &active.raw {
            raw.cancel();
        }
        let rearms = active.rearms;
        drop(active);

        let core = &self.shared.core;
        core.liveness.release(self.id());
        core.emit(TimerEvent::Cancelled { id: self.id() });
        tracing::debug!(timer_id = self.id(), rearms, "guarded timer cancelled");
    }

    /// Marks the timer as keeping the host alive while pending (the default).
    pub fn keep_alive(&self) -> &Self {
        self.set_keep_alive(true)
    }

    /// Lets the host go idle even though this timer is pending.
    pub fn allow_idle_exit(&self) -> &Self {
        self.set_keep_alive(false)
    }

    pub fn is_keep_alive(&self) -> bool {
        self.shared
            .lock()
            .raw
            .as_ref()
            .is_none_or(RawTimer::is_keep_alive)
    }

    pub fn state(&self) -> TimerState {
        self.shared.lock().state
    }

    /// Number of late raw firings that were discarded and re-armed.
    pub fn rearm_count(&self) -> u32 {
        self.shared.lock().rearms
    }

    pub fn requested_delay(&self) -> Duration {
        self.shared.lock().requested
    }

    /// The on-time limit of the live raw timer, while armed.
    pub fn deadline(&self) -> Option<Instant> {
        let active = self.shared.lock();
        (active.state == TimerState::Armed).then(|| active.deadline.instant())
    }

    fn set_keep_alive(&self, keep_alive: bool) -> &Self {
        let mut active = self.shared.lock();
        if let Some(raw) = active.raw.as_mut() {
            raw.set_keep_alive(keep_alive);
        }
        // kept under the lock so the flag and the idle map never disagree
        if active.state == TimerState::Armed {
            self.shared.core.liveness.set_keep_alive(self.id(), keep_alive);
        }
        self
    }
}

impl PartialEq for TimerHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for TimerHandle {}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = self.shared.lock();
        f.debug_struct("TimerHandle")
            .field("id", &self.shared.id)
            .field("state", &active.state)
            .field("requested", &active.requested)
            .field("rearms", &active.rearms)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::GuardedScheduler;

    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_keep_alive_toggles_agree() {
        let scheduler = GuardedScheduler::default();
        let handle = scheduler.schedule(|| {}, Duration::from_secs(60));

        let togglers: Vec<_> = (0..8)
            .map(|n| {
                let handle = handle.clone();
                tokio::spawn(async move {
                    for i in 0..500 {
                        if (i + n) % 2 == 0 {
                            handle.keep_alive();
                        } else {
                            handle.allow_idle_exit();
                        }
                    }
                })
            })
            .collect();
        for toggler in togglers {
            toggler.await.unwrap();
        }

        let liveness = &handle.shared.core.liveness;
        assert_eq!(handle.is_keep_alive(), liveness.has_keep_alive());
        handle.cancel();
        assert!(!liveness.has_keep_alive());
    }
}
