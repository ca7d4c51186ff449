use std::time::Duration;
use tokio::time::Instant;

pub(crate) fn now() -> Instant {
    Instant::now()
}

/// The latest instant at which a raw firing still counts as on time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Deadline {
    at: Instant,
}

impl Deadline {
    /// `armed_at + requested + lag`. Both durations are bounded by `MAX_DELAY`.
    pub(crate) fn after(armed_at: Instant, requested: Duration, lag: Duration) -> Self {
        Self {
            at: armed_at + requested + lag,
        }
    }

    pub(crate) fn instant(&self) -> Instant {
        self.at
    }

    /// How far `now` lies past the deadline, or `None` when it does not.
    pub(crate) fn overrun(&self, now: Instant) -> Option<Duration> {
        now.checked_duration_since(self.at).filter(|late| !late.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_adds_delay_and_lag() {
        let start = Instant::now();
        let lag = Duration::from_millis(500);
        let deadline = Deadline::after(start, Duration::from_millis(100), lag);
        assert_eq!(deadline.instant(), start + Duration::from_millis(600));
    }

    #[test]
    fn test_overrun_only_after_deadline() {
        let start = Instant::now();
        let lag = Duration::from_millis(500);
        let deadline = Deadline::after(start, Duration::from_millis(100), lag);

        assert_eq!(deadline.overrun(start), None);
        assert_eq!(deadline.overrun(start + Duration::from_millis(600)), None);
        assert_eq!(
            deadline.overrun(start + Duration::from_millis(650)),
            Some(Duration::from_millis(50))
        );
    }
}
