// Per-thread phase metrics and run-summary export.
pub mod export;
pub mod metrics;
