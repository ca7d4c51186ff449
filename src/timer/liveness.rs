use dashmap::DashMap;
use tokio::sync::Notify;

use crate::task::TimerId;

/// Armed timers of one scheduler and whether each keeps the host alive.
#[derive(Debug, Default)]
pub(crate) struct Liveness {
    armed: DashMap<TimerId, bool>,
    changed: Notify,
}

impl Liveness {
    pub(crate) fn track(&self, id: TimerId, keep_alive: bool) {
        self.armed.insert(id, keep_alive);
    }

    pub(crate) fn set_keep_alive(&self, id: TimerId, keep_alive: bool) {
        if let Some(mut entry) = self.armed.get_mut(&id) {
            *entry = keep_alive;
        }
        if !keep_alive {
            self.changed.notify_waiters();
        }
    }

    pub(crate) fn release(&self, id: TimerId) {
        if self.armed.remove(&id).is_some() {
            self.changed.notify_waiters();
        }
    }

    pub(crate) fn armed(&self) -> usize {
        self.armed.len()
    }

    pub(crate) fn has_keep_alive(&self) -> bool {
        self.armed.iter().any(|entry| *entry.value())
    }

    pub(crate) async fn until_idle(&self) {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if !self.has_keep_alive() {
                return;
            }
            notified.await;
        }
    }
}
