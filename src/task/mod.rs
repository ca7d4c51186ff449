pub mod runner;
pub mod task;

pub type TimerId = u64;

pub use runner::TaskRunner;

pub use task::TimerRequest;
