//! Per-thread phase timing and the end-of-run summary.
//!
//! Each phase thread owns its own `ThreadReport` and hands it back through `join`, so no
//! metrics state is shared while phases run.

use std::time::Duration;

use crate::config::TerminationPolicy;

/// Duration statistics for one kind of phase on one thread.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseStats {
    pub count: u64,
    pub total: Duration,
    pub min: Option<Duration>,
    pub max: Option<Duration>,
}

impl PhaseStats {
    pub fn record(&mut self, d: Duration) {
        self.count += 1;
        self.total += d;
        self.min = Some(self.min.map_or(d, |m| m.min(d)));
        self.max = Some(self.max.map_or(d, |m| m.max(d)));
    }

    pub fn mean(&self) -> Option<Duration> {
        if self.count == 0 {
            return None;
        }
        Some(self.total.div_f64(self.count as f64))
    }

    pub fn merge(&mut self, other: &PhaseStats) {
        self.count += other.count;
        self.total += other.total;
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThreadReport {
    pub id: usize,
    pub name: String,
    pub cycles: u64,
    pub busy: PhaseStats,
    pub idle: PhaseStats,
    pub idle_bursts: u64,
    /// Fold of every kernel outcome this thread produced.
    pub checksum: u64,
}

impl ThreadReport {
    pub fn new(id: usize, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            cycles: 0,
            busy: PhaseStats::default(),
            idle: PhaseStats::default(),
            idle_bursts: 0,
            checksum: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub threads: usize,
    pub policy: TerminationPolicy,
    /// Coordinator's view of the timed region: from leaving the barrier to its loop exit.
    pub timed_region: Duration,
    /// Whole run: from ROI start until every worker was joined.
    pub elapsed: Duration,
    pub barrier_arrivals: u64,
    pub termination_raised: bool,
    /// One entry per thread, ordered by id.
    pub reports: Vec<ThreadReport>,
}

impl RunSummary {
    pub fn total_cycles(&self) -> u64 {
        self.reports.iter().map(|r| r.cycles).sum()
    }

    pub fn busy_stats(&self) -> PhaseStats {
        let mut all = PhaseStats::default();
        for r in &self.reports {
            all.merge(&r.busy);
        }
        all
    }

    pub fn idle_stats(&self) -> PhaseStats {
        let mut all = PhaseStats::default();
        for r in &self.reports {
            all.merge(&r.idle);
        }
        all
    }

    pub fn checksum(&self) -> u64 {
        self.reports
            .iter()
            .fold(0u64, |acc, r| acc.rotate_left(7) ^ r.checksum)
    }

    /// Prints the per-thread table to stdout.
    pub fn print_report(&self) {
        println!("\nRUN SUMMARY");
        println!("=====================");
        println!(
            "threads={}  policy={}  timed_region={:.3}s  elapsed={:.3}s",
            self.threads,
            self.policy,
            self.timed_region.as_secs_f64(),
            self.elapsed.as_secs_f64()
        );
        println!(
            "{:<10} {:<8} {:<14} {:<14} {:<8} {:<18}",
            "Thread", "Cycles", "Busy avg (ms)", "Idle avg (ms)", "Bursts", "Checksum"
        );
        println!("{}", "=".repeat(76));
        for r in &self.reports {
            println!(
                "{:<10} {:<8} {:<14.2} {:<14.2} {:<8} {:#018x}",
                r.name,
                r.cycles,
                as_ms(r.busy.mean()),
                as_ms(r.idle.mean()),
                r.idle_bursts,
                r.checksum
            );
        }
        println!(
            "total_cycles={}  barrier_arrivals={}  termination_raised={}\n",
            self.total_cycles(),
            self.barrier_arrivals,
            self.termination_raised
        );
    }
}

fn as_ms(d: Option<Duration>) -> f64 {
    d.map_or(0.0, |d| d.as_secs_f64() * 1_000.0)
}
