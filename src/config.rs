//! Run configuration: thread count, termination policy and phase shape.
//!
//! Built once at start-up and never mutated afterwards. `validate()` runs before any
//! thread, barrier or marker exists so a bad configuration never produces a partial trace.

use std::{fmt, time::Duration};

use crate::{
    error::{Result, WorkloadError},
    workload::{busy::BusyBudget, idle::IdleProfile},
};

pub const DEFAULT_THREADS: usize = 1;
pub const DEFAULT_SECONDS: u64 = 10;

/// Busy+Idle cycles per requested second in the single-threaded variant.
pub const CYCLES_PER_SECOND: u64 = 1;

/// How a run decides it is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationPolicy {
    /// Coordinator re-checks elapsed time once per cycle and raises the shared flag.
    WallClock(Duration),
    /// Every thread runs exactly this many Busy+Idle cycles.
    IterationCount(u64),
}

impl TerminationPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            TerminationPolicy::WallClock(_) => "wall_clock",
            TerminationPolicy::IterationCount(_) => "iteration",
        }
    }
}

impl fmt::Display for TerminationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationPolicy::WallClock(d) => write!(f, "wall-clock {:.3}s", d.as_secs_f64()),
            TerminationPolicy::IterationCount(n) => write!(f, "{} cycles", n),
        }
    }
}

/// Shape of one Busy+Idle cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseProfile {
    pub busy: BusyBudget,
    pub idle: IdleProfile,
}

impl PhaseProfile {
    /// One second of scanning, then one second of 1 ms naps with rare bursts.
    pub fn timed() -> Self {
        Self {
            busy: BusyBudget::For(Duration::from_secs(1)),
            idle: IdleProfile::ticking(),
        }
    }

    /// One scan pass, then a single one-second nap with a coin-flip burst.
    pub fn single_pass() -> Self {
        Self {
            busy: BusyBudget::Passes(1),
            idle: IdleProfile::single_nap(),
        }
    }

    /// Timed profile with shortened windows; scheduling semantics are unchanged.
    pub fn scaled(busy: Duration, idle_window: Duration) -> Self {
        let mut idle = IdleProfile::ticking();
        idle.window = idle_window;
        Self {
            busy: BusyBudget::For(busy),
            idle,
        }
    }

    /// Nominal wall-clock length of one cycle, ignoring scheduling noise.
    pub fn nominal_cycle(&self) -> Duration {
        let busy = match self.busy {
            BusyBudget::For(d) => d,
            BusyBudget::Passes(_) => Duration::ZERO,
        };
        busy + self.idle.window.max(self.idle.tick)
    }

    fn validate(&self) -> Result<()> {
        match self.busy {
            BusyBudget::For(d) if d.is_zero() => {
                return Err(WorkloadError::InvalidPhaseProfile("busy duration is zero"));
            }
            BusyBudget::Passes(0) => {
                return Err(WorkloadError::InvalidPhaseProfile("busy pass count is zero"));
            }
            _ => {}
        }
        if self.idle.tick.is_zero() {
            return Err(WorkloadError::InvalidPhaseProfile("idle tick is zero"));
        }
        if !(0.0..=1.0).contains(&self.idle.burst_probability) {
            return Err(WorkloadError::InvalidPhaseProfile(
                "idle burst probability outside [0, 1]",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfiguration {
    pub threads: usize,
    pub policy: TerminationPolicy,
    pub phases: PhaseProfile,
    /// Base seed for every thread's RNG; wall-clock time is used when absent.
    pub seed: Option<u64>,
    pub pin_cores: bool,
}

impl RunConfiguration {
    /// Multi-threaded variant defaults: timed phases, coordinator-driven shutdown.
    pub fn wall_clock(threads: usize, duration: Duration) -> Self {
        Self {
            threads,
            policy: TerminationPolicy::WallClock(duration),
            phases: PhaseProfile::timed(),
            seed: None,
            pin_cores: false,
        }
    }

    /// Single-threaded variant defaults: single-pass phases, exact cycle count.
    pub fn iteration(threads: usize, cycles: u64) -> Self {
        Self {
            threads,
            policy: TerminationPolicy::IterationCount(cycles),
            phases: PhaseProfile::single_pass(),
            seed: None,
            pin_cores: false,
        }
    }

    pub fn with_phases(mut self, phases: PhaseProfile) -> Self {
        self.phases = phases;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_core_pinning(mut self, pin: bool) -> Self {
        self.pin_cores = pin;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.threads < 1 {
            return Err(WorkloadError::InvalidThreadCount(self.threads));
        }
        match self.policy {
            TerminationPolicy::WallClock(d) if d.is_zero() => {
                return Err(WorkloadError::InvalidDuration);
            }
            TerminationPolicy::IterationCount(0) => {
                return Err(WorkloadError::InvalidIterationCount);
            }
            _ => {}
        }
        self.phases.validate()
    }
}

/// Converts the single-threaded variant's `-t` into its fixed cycle budget.
pub fn cycles_for_seconds(seconds: u64) -> u64 {
    seconds.saturating_mul(CYCLES_PER_SECOND)
}
