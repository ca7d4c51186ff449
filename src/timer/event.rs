use std::time::Duration;

use async_channel::{Receiver, Sender, TrySendError};

use crate::task::TimerId;

/// Lifecycle notifications published by a scheduler built with
/// [`GuardConfigBuilder::with_events`](crate::GuardConfigBuilder::with_events).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// A guarded wait started with its first raw timer.
    Armed { id: TimerId, delay: Duration },
    /// A raw timer fired `overrun` past its deadline and was replaced by one
    /// waiting `delay`.
    Rearmed {
        id: TimerId,
        delay: Duration,
        overrun: Duration,
    },
    /// The callback ran.
    Fired { id: TimerId },
    Cancelled { id: TimerId },
}

impl TimerEvent {
    pub fn timer_id(&self) -> TimerId {
        match self {
            Self::Armed { id, .. }
            | Self::Rearmed { id, .. }
            | Self::Fired { id }
            | Self::Cancelled { id } => *id,
        }
    }
}

#[derive(Debug)]
pub(crate) struct EventSink {
    sender: Sender<TimerEvent>,
    receiver: Receiver<TimerEvent>,
}

impl EventSink {
    pub(crate) fn bounded(capacity: usize) -> Self {
        let (sender, receiver) = async_channel::bounded(capacity);
        Self { sender, receiver }
    }

    /// Never blocks: a full channel drops the event.
    pub(crate) fn emit(&self, event: TimerEvent) {
        if let Err(TrySendError::Full(event)) = self.sender.try_send(event) {
            tracing::trace!(?event, "timer event channel full, event dropped");
        }
    }

    pub(crate) fn subscribe(&self) -> Receiver<TimerEvent> {
        self.receiver.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_channel_drops_events() {
        let sink = EventSink::bounded(1);
        let events = sink.subscribe();
        sink.emit(TimerEvent::Fired { id: 1 });
        sink.emit(TimerEvent::Cancelled { id: 2 });

        assert_eq!(events.try_recv(), Ok(TimerEvent::Fired { id: 1 }));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_timer_id() {
        let event = TimerEvent::Rearmed {
            id: 4,
            delay: Duration::from_millis(10),
            overrun: Duration::from_millis(1),
        };
        assert_eq!(event.timer_id(), 4);
    }
}
