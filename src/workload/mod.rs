//! Workload kernels: CPU-bound "busy" scans and lightly loaded "idle" naps.
//!
//! Kernels only touch their own buffers and the calling thread's RNG. Their outcomes are
//! returned to the caller so the computation is observably consumed.

pub mod busy;
pub mod idle;
pub mod rng;

pub use busy::{BusyBudget, BusyOutcome, busy_phase};
pub use idle::{IdleOutcome, IdleProfile, idle_phase};
pub use rng::WorkloadRng;
