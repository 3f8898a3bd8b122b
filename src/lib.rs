//! # Active/Idle Workload Generator
//!
//! Synthetic multi-threaded workload for trace-driven CPU and power simulators. Every
//! thread alternates a compute-bound Busy phase and a sleep-dominated Idle phase, and
//! reports each boundary to an external marker API so the recorded trace can be split
//! into phases afterwards.
//!
//! ## Layout
//! - [`coordination`]: start-up barrier and the single-writer termination flag.
//! - [`workload`]: busy and idle kernels plus the per-thread RNG.
//! - [`scheduler`]: the per-thread phase state machine and the thread lifecycle.
//! - [`instrumentation`]: marker / region-of-interest interface and its sinks.
//! - [`utils`]: per-thread phase metrics and the run-summary CSV.
//!
//! ## Variants
//! - Wall-clock: `N` threads, coordinator raises the flag once `D` seconds have elapsed.
//! - Iteration: fixed cycle count per thread, shorter single-pass phases.

pub mod cli;
pub mod config;
pub mod coordination;
pub mod error;
pub mod instrumentation;
pub mod runner;
pub mod scheduler;
pub mod utils;
pub mod workload;

pub use config::{PhaseProfile, RunConfiguration, TerminationPolicy};
pub use error::{Result, WorkloadError};
pub use runner::{OutputOptions, run};
pub use scheduler::run_workload;
