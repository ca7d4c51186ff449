pub(crate) mod clock;
pub mod event;
pub mod handle;
pub(crate) mod liveness;
pub(crate) mod raw;

pub use event::TimerEvent;
pub use handle::{TimerHandle, TimerState};
