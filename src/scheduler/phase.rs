//! phase.rs
//! Per-thread Busy/Idle state machine.
//!
//! ```text
//! AwaitingBarrier --(barrier released, check)--> Busy | Terminating
//! Busy            --(busy kernel done)---------> Idle
//! Idle            --(idle kernel done, check)--> Busy | Terminating
//! Terminating     -----------------------------> Exited
//! ```
//!
//! The termination check runs only at cycle boundaries, never inside a phase, so a thread
//! always finishes the phase it is in. Wall-clock runs: the coordinator compares elapsed
//! time against the limit and raises the shared flag; every other thread polls the flag.
//! Iteration runs: every thread counts its own completed cycles.

use std::{
    hint::black_box,
    sync::Arc,
    time::{Duration, Instant},
};

use log::{debug, info};

use crate::{
    config::{PhaseProfile, TerminationPolicy},
    coordination::{StartBarrier, TerminationSignal, TerminationWatch},
    instrumentation::{Instrumentation, MarkerKind},
    utils::metrics::ThreadReport,
    workload::{WorkloadRng, busy_phase, idle_phase},
};

pub const COORDINATOR_ID: usize = 0;

/// Stable identity of one phase thread. Id 0 is the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadContext {
    id: usize,
    name: String,
}

impl ThreadContext {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            name: display_name(id),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_coordinator(&self) -> bool {
        self.id == COORDINATOR_ID
    }
}

/// Display name reported to the marker API for thread `id`.
pub fn display_name(id: usize) -> String {
    format!("thread{}", id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    AwaitingBarrier,
    Busy,
    Idle,
    Terminating,
    Exited,
}

/// What a thread hands back when its loop exits.
#[derive(Debug, Clone)]
pub struct PhaseOutcome {
    pub report: ThreadReport,
    /// From leaving the barrier to leaving the loop.
    pub timed_region: Duration,
}

pub struct PhaseScheduler {
    ctx: ThreadContext,
    policy: TerminationPolicy,
    phases: PhaseProfile,
    instrumentation: Arc<dyn Instrumentation>,
    watch: TerminationWatch,
    // Present only on the coordinator, until it is raised.
    signal: Option<TerminationSignal>,
    state: PhaseState,
    cycles: u64,
    started: Option<Instant>,
}

impl PhaseScheduler {
    pub fn coordinator(
        policy: TerminationPolicy,
        phases: PhaseProfile,
        instrumentation: Arc<dyn Instrumentation>,
        signal: TerminationSignal,
    ) -> Self {
        Self {
            ctx: ThreadContext::new(COORDINATOR_ID),
            policy,
            phases,
            instrumentation,
            watch: signal.watch(),
            signal: Some(signal),
            state: PhaseState::AwaitingBarrier,
            cycles: 0,
            started: None,
        }
    }

    pub fn worker(
        ctx: ThreadContext,
        policy: TerminationPolicy,
        phases: PhaseProfile,
        instrumentation: Arc<dyn Instrumentation>,
        watch: TerminationWatch,
    ) -> Self {
        Self {
            ctx,
            policy,
            phases,
            instrumentation,
            watch,
            signal: None,
            state: PhaseState::AwaitingBarrier,
            cycles: 0,
            started: None,
        }
    }

    pub fn context(&self) -> &ThreadContext {
        &self.ctx
    }

    pub fn instrumentation(&self) -> &dyn Instrumentation {
        self.instrumentation.as_ref()
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    /// Drives the state machine from `AwaitingBarrier` to `Exited`.
    pub fn run(mut self, barrier: &StartBarrier, rng: &mut WorkloadRng) -> PhaseOutcome {
        let mut report = ThreadReport::new(self.ctx.id(), self.ctx.name());

        loop {
            self.state = match self.state {
                PhaseState::AwaitingBarrier => {
                    barrier.wait();
                    self.started = Some(Instant::now());
                    self.next_cycle()
                }
                PhaseState::Busy => {
                    self.run_busy(rng, &mut report);
                    PhaseState::Idle
                }
                PhaseState::Idle => {
                    self.run_idle(rng, &mut report);
                    self.cycles += 1;
                    report.cycles = self.cycles;
                    if let TerminationPolicy::IterationCount(total) = self.policy {
                        info!("[{}] completed cycle {} of {}", self.ctx.name(), self.cycles, total);
                    }
                    self.next_cycle()
                }
                PhaseState::Terminating => {
                    debug!(
                        "[{}] leaving phase loop after {} cycles",
                        self.ctx.name(),
                        self.cycles
                    );
                    PhaseState::Exited
                }
                PhaseState::Exited => break,
            };
        }

        PhaseOutcome {
            report,
            timed_region: self.started.map(|s| s.elapsed()).unwrap_or_default(),
        }
    }

    fn run_busy(&self, rng: &mut WorkloadRng, report: &mut ThreadReport) {
        let id = self.ctx.id();
        self.instrumentation.marker(MarkerKind::BusyBegin, id);
        let t0 = Instant::now();
        let out = busy_phase(rng, self.phases.busy);
        report.busy.record(t0.elapsed());
        self.instrumentation.marker(MarkerKind::BusyEnd, id);

        report.checksum = report.checksum.rotate_left(5) ^ black_box(out.checksum());
        debug!(
            "[{}] busy: sum={} floating={:.6} bits={:#x} passes={}",
            self.ctx.name(),
            out.sum,
            out.floating,
            out.bits,
            out.passes
        );
    }

    fn run_idle(&self, rng: &mut WorkloadRng, report: &mut ThreadReport) {
        let id = self.ctx.id();
        self.instrumentation.marker(MarkerKind::IdleBegin, id);
        let t0 = Instant::now();
        let out = idle_phase(rng, &self.phases.idle);
        report.idle.record(t0.elapsed());
        self.instrumentation.marker(MarkerKind::IdleEnd, id);

        report.idle_bursts += out.bursts;
        report.checksum = report.checksum.rotate_left(5) ^ black_box(out.checksum());
        debug!(
            "[{}] idle: sum={} floating={:.6} bursts={}/{}",
            self.ctx.name(),
            out.sum,
            out.floating,
            out.bursts,
            out.ticks
        );
    }

    fn next_cycle(&mut self) -> PhaseState {
        if self.should_stop() {
            PhaseState::Terminating
        } else {
            PhaseState::Busy
        }
    }

    fn should_stop(&mut self) -> bool {
        match self.policy {
            TerminationPolicy::WallClock(limit) => {
                if self.signal.is_none() {
                    return self.watch.is_raised();
                }
                let elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
                if elapsed < limit {
                    return false;
                }
                if let Some(signal) = self.signal.take() {
                    info!(
                        "[{}] time's up after {:.3}s, raising termination flag",
                        self.ctx.name(),
                        elapsed.as_secs_f64()
                    );
                    signal.raise();
                }
                true
            }
            TerminationPolicy::IterationCount(total) => self.cycles >= total,
        }
    }
}
