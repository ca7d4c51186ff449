use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};

use tokio::sync::oneshot;

use crate::{error::Cancelled, scheduler::GuardedScheduler, timer::TimerHandle};

/// A future that completes when a guarded callback scheduled at creation
/// time would have run, lag compensation included.
///
/// The live [`TimerHandle`] is exposed through [`handle`](Self::handle).
/// Cancelling it resolves the future with [`Cancelled`]; dropping the future
/// before it resolves cancels the timer.
#[derive(Debug)]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct GuardedSleep {
    handle: TimerHandle,
    done: oneshot::Receiver<()>,
    resolved: bool,
}

impl GuardedSleep {
    pub(crate) fn new(scheduler: &GuardedScheduler, delay: Duration) -> Self {
        let (tx, done) = oneshot::channel();
        let handle = scheduler.schedule(
            move || {
                let _ = tx.send(());
            },
            delay,
        );
        Self {
            handle,
            done,
            resolved: false,
        }
    }

    pub fn handle(&self) -> &TimerHandle {
        &self.handle
    }
}

impl Future for GuardedSleep {
    type Output = Result<(), Cancelled>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let result = match Pin::new(&mut this.done).poll(cx) {
            Poll::Ready(result) => result,
            Poll::Pending => return Poll::Pending,
        };
        this.resolved = true;
        Poll::Ready(result.map_err(|_| Cancelled(this.handle.id())))
    }
}

impl Drop for GuardedSleep {
    fn drop(&mut self) {
        if !self.resolved {
            self.handle.cancel();
        }
    }
}
