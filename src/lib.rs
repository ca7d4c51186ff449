//! Lag-guarded one-shot timers for the tokio runtime.
//!
//! On a busy event loop a timer can fire long after its delay elapsed,
//! because other work kept the thread occupied. A [`GuardedScheduler`]
//! checks every raw firing against `delay + lag` measured from the moment
//! the timer was armed. A late firing is discarded and the timer is re-armed
//! with a fresh tolerance window, so the callback runs exactly once, never
//! early, and never at an arbitrarily stale moment.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use guardtimer::{GuardConfig, GuardedScheduler};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // default scheduler, 1s lag tolerance
//! let handle = guardtimer::schedule(|| println!("tick"), Duration::from_millis(100));
//! handle.allow_idle_exit();
//!
//! // custom tolerance and reschedule delay
//! let config = GuardConfig::builder()
//!     .with_lag_millis(500)
//!     .with_rescheduler(|delay, _handle| delay / 10)
//!     .build();
//! let scheduler = GuardedScheduler::create(config)?;
//! scheduler.sleep(Duration::from_millis(100)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! Timers are spawned on the runtime current at scheduling time; the
//! `current_thread` flavour is the cooperative setting the lag guard targets.

pub mod config;
pub mod error;
pub mod scheduler;
pub mod sleep;
pub mod task;
pub mod timer;

pub use config::{DEFAULT_LAG, GuardConfig, GuardConfigBuilder, MAX_DELAY, Rescheduler};
pub use error::{Cancelled, ConfigError};
pub use scheduler::{GuardedScheduler, default_scheduler, schedule, schedule_with, sleep};
pub use sleep::GuardedSleep;
pub use task::{TaskRunner, TimerId, TimerRequest};
pub use timer::{TimerEvent, TimerHandle, TimerState};
