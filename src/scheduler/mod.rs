//! Phase scheduling: the per-thread Busy/Idle state machine and the lifecycle that
//! starts, synchronises and joins the phase threads.

pub mod lifecycle;
pub mod phase;

pub use lifecycle::run_workload;
pub use phase::{PhaseOutcome, PhaseScheduler, PhaseState, ThreadContext, display_name};
