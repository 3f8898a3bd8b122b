//! error.rs
//! Every failure in this crate is fatal: configuration errors are rejected before any
//! thread exists, everything else aborts the run. There is no retry path.

use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("Number of threads must be >= 1 (got {0})")]
    InvalidThreadCount(usize),

    #[error("Run duration must be greater than zero")]
    InvalidDuration,

    #[error("Iteration count must be >= 1")]
    InvalidIterationCount,

    #[error("Invalid phase profile: {0}")]
    InvalidPhaseProfile(&'static str),

    #[error("Failed to create thread {id}: {source}")]
    ThreadSpawn {
        id: usize,
        #[source]
        source: io::Error,
    },

    #[error("Thread {id} panicked before finishing its phase loop")]
    WorkerPanicked { id: usize },

    #[error("Trace output {path:?}: {source}")]
    TraceIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Summary output {path:?}: {source}")]
    SummaryIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("Trace is incomplete: {dropped} marker(s) could not be recorded")]
    TraceIncomplete { dropped: u64 },
}

impl WorkloadError {
    /// Process exit status for this error. The consuming simulator only distinguishes
    /// success from failure, so every error shares one status.
    pub fn exit_code(&self) -> u8 {
        1
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            WorkloadError::InvalidThreadCount(_)
                | WorkloadError::InvalidDuration
                | WorkloadError::InvalidIterationCount
                | WorkloadError::InvalidPhaseProfile(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, WorkloadError>;
