use std::time::Duration;

use tokio::task::AbortHandle;

/// One armed tokio sleep followed by a handler.
///
/// tokio tasks carry no ref/unref state, so the keep-alive flag is shadowed
/// here and copied onto the replacement when a late timer is re-armed.
#[derive(Debug)]
pub(crate) struct RawTimer {
    task: AbortHandle,
    keep_alive: bool,
}

impl RawTimer {
    /// Spawns the timer task on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, like [`tokio::spawn`].
    pub(crate) fn arm<F>(delay: Duration, keep_alive: bool, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        // The expiry is fixed here, not when the task is first polled.
        let sleep = tokio::time::sleep(delay);
        let task = tokio::spawn(async move {
            sleep.await;
            on_fire();
        });
        Self {
            task: task.abort_handle(),
            keep_alive,
        }
    }

    pub(crate) fn cancel(&self) {
        self.task.abort();
    }

    pub(crate) fn is_keep_alive(&self) -> bool {
        self.keep_alive
    }

    pub(crate) fn set_keep_alive(&mut self, keep_alive: bool) {
        self.keep_alive = keep_alive;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_raw_timer_fires_after_delay() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let start = tokio::time::Instant::now();
        let raw = RawTimer::arm(Duration::from_millis(100), true, move || {
            tx.send(()).unwrap();
        });
        assert!(raw.is_keep_alive());

        rx.await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_is_fixed_at_arm_time() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        let start = tokio::time::Instant::now();
        let _raw = RawTimer::arm(Duration::from_millis(100), true, move || {
            tx.send(tokio::time::Instant::now()).unwrap();
        });

        // the task is first polled only after the clock moved on
        tokio::time::advance(Duration::from_millis(300)).await;
        let fired_at = rx.await.unwrap();
        let elapsed = fired_at - start;
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_millis(310), "fired after {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_raw_timer_never_fires() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let mut raw = RawTimer::arm(Duration::from_millis(100), true, move || {
            flag.store(true, Ordering::SeqCst);
        });
        raw.set_keep_alive(false);
        assert!(!raw.is_keep_alive());

        raw.cancel();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
