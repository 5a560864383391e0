//! Batch enrollment: run state and the sequential runner

pub mod progress;
pub mod runner;
pub mod state;

pub use progress::ProgressTracker;
pub use runner::BatchRunner;
pub use state::{LogEntry, RowPhase, RowStatus, RunState};
