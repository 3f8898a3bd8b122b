//! Cross-thread coordination: the start-up barrier and the single-writer termination flag.
//!
//! Both are plain owned values handed to each thread's entry point, never globals, so they
//! can be exercised on their own with any party count.

pub mod barrier;
pub mod termination;

pub use barrier::{BarrierWaitResult, StartBarrier};
pub use termination::{TerminationSignal, TerminationWatch, termination_pair};
