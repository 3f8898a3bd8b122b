//! Glue between a parsed command line and [`run_workload`]: picks the marker sink,
//! runs, closes the trace and exports the summary.

use std::{path::PathBuf, sync::Arc};

use log::{info, warn};

use crate::{
    config::RunConfiguration,
    error::{Result, WorkloadError},
    instrumentation::{Instrumentation, LogInstrumentation, TraceRecorder},
    scheduler::run_workload,
    utils::{export::export_summary_csv, metrics::RunSummary},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputOptions {
    /// CSV trace of every marker; markers go to the log when absent.
    pub trace: Option<PathBuf>,
    /// CSV file the run summary is appended to.
    pub summary: Option<PathBuf>,
}

pub fn run(config: &RunConfiguration, outputs: &OutputOptions) -> Result<RunSummary> {
    // Reject bad input before the trace file is created.
    config.validate()?;

    let summary = match &outputs.trace {
        Some(path) => {
            let recorder = Arc::new(TraceRecorder::create(path)?);
            let sink: Arc<dyn Instrumentation> = recorder.clone();
            let summary = run_workload(config, sink)?;

            let stats = recorder.finish()?;
            if stats.dropped > 0 {
                warn!("[Runner] {} marker(s) missing from {:?}", stats.dropped, path);
                return Err(WorkloadError::TraceIncomplete {
                    dropped: stats.dropped,
                });
            }
            info!("[Runner] trace written: {} events -> {:?}", stats.written, path);
            summary
        }
        None => run_workload(config, Arc::new(LogInstrumentation))?,
    };

    if let Some(path) = &outputs.summary {
        export_summary_csv(&summary, path)?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::PhaseProfile,
        instrumentation::{MarkerKind, read_trace},
    };
    use std::time::Duration;

    fn fast(cfg: RunConfiguration) -> RunConfiguration {
        cfg.with_phases(PhaseProfile::scaled(
            Duration::from_millis(5),
            Duration::from_millis(5),
        ))
    }

    #[test]
    fn trace_and_summary_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let outputs = OutputOptions {
            trace: Some(dir.path().join("trace.csv")),
            summary: Some(dir.path().join("summary.csv")),
        };
        let cfg = fast(RunConfiguration::iteration(2, 3));
        let summary = run(&cfg, &outputs).unwrap();
        assert_eq!(summary.total_cycles(), 6);

        let rows = read_trace(dir.path().join("trace.csv")).unwrap();
        let busy = rows
            .iter()
            .filter(|r| r.kind() == Some(MarkerKind::BusyBegin))
            .count();
        assert_eq!(busy, 6);
        assert_eq!(rows.first().map(|r| r.event.as_str()), Some("roi_start"));
        assert_eq!(rows.last().map(|r| r.event.as_str()), Some("roi_end"));

        let text = std::fs::read_to_string(dir.path().join("summary.csv")).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn rejected_config_creates_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        let trace = dir.path().join("trace.csv");
        let outputs = OutputOptions {
            trace: Some(trace.clone()),
            summary: None,
        };
        let cfg = RunConfiguration::wall_clock(0, Duration::from_secs(1));
        assert!(matches!(
            run(&cfg, &outputs),
            Err(WorkloadError::InvalidThreadCount(0))
        ));
        assert!(!trace.exists());
    }

    #[test]
    fn log_sink_when_no_trace_requested() {
        let cfg = fast(RunConfiguration::iteration(1, 1));
        let summary = run(&cfg, &OutputOptions::default()).unwrap();
        assert_eq!(summary.total_cycles(), 1);
    }
}
