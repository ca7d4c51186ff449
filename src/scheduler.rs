use std::{
    sync::{
        Arc, LazyLock,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use async_channel::Receiver;

use crate::{
    config::GuardConfig,
    error::ConfigError,
    sleep::GuardedSleep,
    task::{TaskRunner, TimerId, TimerRequest, task::Job},
    timer::{
        TimerEvent, TimerHandle, TimerState,
        clock::{self, Deadline},
        event::EventSink,
        handle::{ActiveTimer, TimerShared},
        liveness::Liveness,
        raw::RawTimer,
    },
};

static DEFAULT_SCHEDULER: LazyLock<GuardedScheduler> = LazyLock::new(GuardedScheduler::default);

/// The process-wide scheduler with the default [`GuardConfig`].
pub fn default_scheduler() -> &'static GuardedScheduler {
    &DEFAULT_SCHEDULER
}

/// State shared by a scheduler and every timer it created.
#[derive(Debug)]
pub(crate) struct SchedulerCore {
    pub(crate) config: GuardConfig,
    pub(crate) liveness: Liveness,
    events: Option<EventSink>,
    next_id: AtomicU64,
}

impl SchedulerCore {
    fn new(config: GuardConfig) -> Self {
        let events = config.event_capacity().map(EventSink::bounded);
        Self {
            config,
            liveness: Liveness::default(),
            events,
            next_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn emit(&self, event: TimerEvent) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }

    fn next_id(&self) -> TimerId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

/// Schedules one-shot callbacks that are protected against event-loop lag.
///
/// Whenever a raw timer fires later than `delay + lag` after it was armed,
/// the firing is discarded and a fresh raw timer is armed instead, so the
/// callback runs exactly once and only on an on-time firing.
///
/// Timers run on the tokio runtime that is current when they are scheduled.
#[derive(Debug, Clone)]
pub struct GuardedScheduler {
    core: Arc<SchedulerCore>,
}

impl Default for GuardedScheduler {
    fn default() -> Self {
        Self::from_validated(GuardConfig::default())
    }
}

impl GuardedScheduler {
    /// Builds an independent scheduler, rejecting an invalid configuration up front.
    pub fn create(config: GuardConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_validated(config))
    }

    fn from_validated(config: GuardConfig) -> Self {
        Self {
            core: Arc::new(SchedulerCore::new(config)),
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.core.config
    }

    /// Runs `callback` once, after `delay`, on an on-time firing.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn schedule<F>(&self, callback: F, delay: Duration) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule_with(move |()| callback(), delay, ())
    }

    /// Like [`schedule`](Self::schedule), handing `args` to the callback.
    pub fn schedule_with<F, A>(&self, callback: F, delay: Duration, args: A) -> TimerHandle
    where
        F: FnOnce(A) + Send + 'static,
        A: Send + 'static,
    {
        self.submit(TimerRequest::new(callback, delay, args))
    }

    /// Arms the first raw timer of `request`.
    pub fn submit(&self, request: TimerRequest) -> TimerHandle {
        let (job, requested) = request.into_parts();
        let id = self.core.next_id();
        let shared = Arc::new(TimerShared::new(id, requested, Arc::clone(&self.core)));

        {
            let mut active = shared.lock();
            self.core.liveness.track(id, true);
            arm(&shared, &mut active, requested, true, job);
        }

        self.core.emit(TimerEvent::Armed {
            id,
            delay: requested,
        });
        tracing::debug!(timer_id = id, ?requested, "guarded timer armed");
        TimerHandle::new(shared)
    }

    /// A future resolving when a guarded callback scheduled now would run.
    pub fn sleep(&self, delay: Duration) -> GuardedSleep {
        GuardedSleep::new(self, delay)
    }

    /// Spawns `runner` on the runtime once the guarded wait fires.
    ///
    /// Errors returned by the runner are logged.
    pub fn spawn_after<T>(&self, runner: T, delay: Duration) -> TimerHandle
    where
        T: TaskRunner<Output = ()>,
    {
        self.schedule(
            move || {
                tokio::spawn(async move {
                    if let Err(err) = runner.run().await {
                        tracing::warn!(error = ?err, "delayed task failed");
                    }
                });
            },
            delay,
        )
    }

    /// Receiver of [`TimerEvent`]s, when the scheduler was built with events.
    ///
    /// Receivers share one queue: each event goes to a single receiver.
    pub fn events(&self) -> Option<Receiver<TimerEvent>> {
        self.core.events.as_ref().map(EventSink::subscribe)
    }

    /// Number of timers that are still armed.
    pub fn pending(&self) -> usize {
        self.core.liveness.armed()
    }

    /// Resolves once no armed timer of this scheduler is marked keep-alive.
    pub async fn until_idle(&self) {
        self.core.liveness.until_idle().await
    }
}

/// Arms a raw timer for `active` and restarts its tolerance window.
///
/// Called with the lock held so the raw timer cannot fire before it is stored.
fn arm(
    shared: &Arc<TimerShared>,
    active: &mut ActiveTimer,
    delay: Duration,
    keep_alive: bool,
    job: Job,
) {
    let fired = Arc::clone(shared);
    active.raw = Some(RawTimer::arm(delay, keep_alive, move || on_raw_fire(fired, job)));
    active.deadline = Deadline::after(clock::now(), active.requested, shared.core.config.lag());
}

/// Runs on every raw firing: invokes the job when on time, re-arms when late.
fn on_raw_fire(shared: Arc<TimerShared>, job: Job) {
    let core = &shared.core;
    let id = shared.id;

    let (requested, overrun) = {
        let mut active = shared.lock();
        if active.state != TimerState::Armed {
            return;
        }
        let overrun = active.deadline.overrun(clock::now());
        match overrun {
            None => {
                active.state = TimerState::Fired;
                let rearms = active.rearms;
                drop(active);

                core.liveness.release(id);
                core.emit(TimerEvent::Fired { id });
                tracing::debug!(timer_id = id, rearms, "guarded timer fired");
                job();
                return;
            }
            Some(overrun) => (active.requested, overrun),
        }
    };

    // The rescheduler is user code and may touch the handle, so no lock here.
    let handle = TimerHandle::new(Arc::clone(&shared));
    let mut unwind = AbandonOnUnwind {
        shared: &shared,
        rearming: true,
    };
    let delay = core.config.reschedule_delay(requested, &handle);
    unwind.rearming = false;

    let mut active = shared.lock();
    if active.state != TimerState::Armed {
        return;
    }
    let keep_alive = active.raw.as_ref().is_none_or(RawTimer::is_keep_alive);
    arm(&shared, &mut active, delay, keep_alive, job);
    active.rearms = active.rearms.saturating_add(1);
    let rearms = active.rearms;
    drop(active);

    core.emit(TimerEvent::Rearmed { id, delay, overrun });
    tracing::debug!(
        timer_id = id,
        ?overrun,
        ?delay,
        rearms,
        "late timer firing discarded, re-armed"
    );
}

/// Cancels a late timer whose rescheduler panicked, so it does not stay
/// armed without a raw timer. The panic keeps unwinding.
struct AbandonOnUnwind<'a> {
    shared: &'a TimerShared,
    rearming: bool,
}

impl Drop for AbandonOnUnwind<'_> {
    fn drop(&mut self) {
        if !self.rearming {
            return;
        }
        let mut active = self.shared.lock();
        if active.state != TimerState::Armed {
            return;
        }
        active.state = TimerState::Cancelled;
        drop(active);

        let id = self.shared.id;
        self.shared.core.liveness.release(id);
        self.shared.core.emit(TimerEvent::Cancelled { id });
        tracing::warn!(timer_id = id, "rescheduler panicked, guarded timer cancelled");
    }
}

/// Schedules `callback` on the [`default_scheduler`].
pub fn schedule<F>(callback: F, delay: Duration) -> TimerHandle
where
    F: FnOnce() + Send + 'static,
{
    default_scheduler().schedule(callback, delay)
}

/// Schedules `callback` with `args` on the [`default_scheduler`].
pub fn schedule_with<F, A>(callback: F, delay: Duration, args: A) -> TimerHandle
where
    F: FnOnce(A) + Send + 'static,
    A: Send + 'static,
{
    default_scheduler().schedule_with(callback, delay, args)
}

/// A [`GuardedSleep`] on the [`default_scheduler`].
pub fn sleep(delay: Duration) -> GuardedSleep {
    default_scheduler().sleep(delay)
}
