use std::time::Duration;

use crate::config::MAX_DELAY;

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// A callback together with its arguments and the delay it asked for.
///
/// The request is frozen once scheduling begins: every rearm reuses the same
/// requested delay and hands the same arguments to the callback.
pub struct TimerRequest {
    job: Job,
    requested: Duration,
}

impl TimerRequest {
    pub fn new<F, A>(callback: F, delay: Duration, args: A) -> Self
    where
        F: FnOnce(A) + Send + 'static,
        A: Send + 'static,
    {
        Self {
            job: Box::new(move || callback(args)),
            requested: delay.min(MAX_DELAY),
        }
    }

    /// The delay this request waits for, clamped to [`MAX_DELAY`].
    pub fn requested_delay(&self) -> Duration {
        self.requested
    }

    pub(crate) fn into_parts(self) -> (Job, Duration) {
        (self.job, self.requested)
    }
}
