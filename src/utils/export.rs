//! export.rs
//! Appends one row per run to a summary CSV so repeated runs (different thread counts,
//! durations, seeds) can be compared side by side. The header is written only when the
//! file is new.

use std::{fs::OpenOptions, path::Path};

use csv::WriterBuilder;
use log::info;
use serde::Serialize;

use crate::{
    config::TerminationPolicy,
    error::{Result, WorkloadError},
    utils::metrics::RunSummary,
};

#[derive(Debug, Serialize)]
struct SummaryRow {
    policy: &'static str,
    threads: usize,
    budget: u64,
    timed_region_ms: f64,
    elapsed_ms: f64,
    total_cycles: u64,
    min_thread_cycles: u64,
    max_thread_cycles: u64,
    busy_avg_ms: f64,
    idle_avg_ms: f64,
    barrier_arrivals: u64,
    termination_raised: bool,
    checksum: String,
}

impl SummaryRow {
    fn from_summary(summary: &RunSummary) -> Self {
        let budget = match summary.policy {
            TerminationPolicy::WallClock(d) => d.as_millis() as u64,
            TerminationPolicy::IterationCount(n) => n,
        };
        let cycles = summary.reports.iter().map(|r| r.cycles);
        Self {
            policy: summary.policy.label(),
            threads: summary.threads,
            budget,
            timed_region_ms: summary.timed_region.as_secs_f64() * 1_000.0,
            elapsed_ms: summary.elapsed.as_secs_f64() * 1_000.0,
            total_cycles: summary.total_cycles(),
            min_thread_cycles: cycles.clone().min().unwrap_or(0),
            max_thread_cycles: cycles.max().unwrap_or(0),
            busy_avg_ms: summary
                .busy_stats()
                .mean()
                .map_or(0.0, |d| d.as_secs_f64() * 1_000.0),
            idle_avg_ms: summary
                .idle_stats()
                .mean()
                .map_or(0.0, |d| d.as_secs_f64() * 1_000.0),
            barrier_arrivals: summary.barrier_arrivals,
            termination_raised: summary.termination_raised,
            checksum: format!("{:#018x}", summary.checksum()),
        }
    }
}

/// Appends `summary` to the CSV at `path`, creating it (with header) if needed.
pub fn export_summary_csv(summary: &RunSummary, path: &Path) -> Result<()> {
    let file_exists = path.exists();

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| WorkloadError::SummaryIo {
            path: path.to_path_buf(),
            source,
        })?;

    let mut wtr = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);
    wtr.serialize(SummaryRow::from_summary(summary))?;
    wtr.flush().map_err(|source| WorkloadError::SummaryIo {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Summary exported to: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::metrics::ThreadReport;
    use std::time::Duration;

    fn summary(cycles: &[u64]) -> RunSummary {
        RunSummary {
            threads: cycles.len(),
            policy: TerminationPolicy::WallClock(Duration::from_secs(2)),
            timed_region: Duration::from_millis(2_050),
            elapsed: Duration::from_millis(2_100),
            barrier_arrivals: cycles.len() as u64,
            termination_raised: true,
            reports: cycles
                .iter()
                .enumerate()
                .map(|(id, &c)| {
                    let mut r = ThreadReport::new(id, &format!("thread{id}"));
                    r.cycles = c;
                    r
                })
                .collect(),
        }
    }

    #[test]
    fn header_written_once_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");

        export_summary_csv(&summary(&[1, 2]), &path).unwrap();
        export_summary_csv(&summary(&[3]), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("policy,threads,budget"));
        assert!(lines[1].starts_with("wall_clock,2,2000,"));
        assert!(lines[2].starts_with("wall_clock,1,2000,"));
    }

    #[test]
    fn row_reports_cycle_spread() {
        let row = SummaryRow::from_summary(&summary(&[4, 2, 3]));
        assert_eq!(row.total_cycles, 9);
        assert_eq!(row.min_thread_cycles, 2);
        assert_eq!(row.max_thread_cycles, 4);
    }

    #[test]
    fn missing_directory_is_a_summary_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("summary.csv");
        assert!(matches!(
            export_summary_csv(&summary(&[1]), &path),
            Err(WorkloadError::SummaryIo { .. })
        ));
    }
}
