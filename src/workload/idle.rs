//! idle.rs
//! Lightly loaded phase kernel: mostly asleep, occasionally waking for a short burst of
//! trivial arithmetic, like an application stalled on I/O.

use std::{
    hint::{black_box, spin_loop},
    sync::atomic::{Ordering, fence},
    time::{Duration, Instant},
};

use spin_sleep::{SpinSleeper, SpinStrategy};

use crate::workload::rng::WorkloadRng;

// Sleep natively for all but the last 20 µs of a tick, then yield-spin.
const NATIVE_ACCURACY_NS: u32 = 20_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdleProfile {
    /// Total length of the phase.
    pub window: Duration,
    /// Length of each nap between burst opportunities.
    pub tick: Duration,
    /// Probability that a tick starts with a burst.
    pub burst_probability: f64,
    /// Arithmetic steps per burst.
    pub burst_len: u32,
    /// Issue a full fence after every burst step.
    pub fenced: bool,
}

impl IdleProfile {
    /// 1 s of 1 ms naps, ~5% of which are preceded by a burst.
    pub fn ticking() -> Self {
        Self {
            window: Duration::from_secs(1),
            tick: Duration::from_millis(1),
            burst_probability: 0.05,
            burst_len: 1_000,
            fenced: false,
        }
    }

    /// A single 1 s nap preceded by a fenced burst half of the time.
    pub fn single_nap() -> Self {
        Self {
            window: Duration::from_secs(1),
            tick: Duration::from_secs(1),
            burst_probability: 0.5,
            burst_len: 1_000,
            fenced: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdleOutcome {
    pub sum: u64,
    pub floating: f64,
    pub ticks: u64,
    pub bursts: u64,
}

impl IdleOutcome {
    pub fn checksum(&self) -> u64 {
        self.sum ^ self.floating.to_bits() ^ (self.bursts << 32) ^ self.ticks
    }
}

/// Runs one idle phase.
///
/// Each tick: roll the thread's RNG against `burst_probability`, run a burst on a hit,
/// then nap for `tick`. Ticks repeat until `window` has elapsed; at least one tick
/// always runs.
pub fn idle_phase(rng: &mut WorkloadRng, profile: &IdleProfile) -> IdleOutcome {
    let sleeper = SpinSleeper::new(NATIVE_ACCURACY_NS).with_spin_strategy(SpinStrategy::YieldThread);
    let start = Instant::now();

    let mut sum: u64 = 0;
    let mut floating: f64 = 1.0;
    let mut ticks: u64 = 0;
    let mut bursts: u64 = 0;

    loop {
        if rng.chance(profile.burst_probability) {
            burst(profile, &mut sum, &mut floating);
            bursts += 1;
        }
        sleeper.sleep(profile.tick);
        ticks += 1;

        if start.elapsed() >= profile.window {
            break;
        }
    }

    if profile.fenced {
        fence(Ordering::SeqCst);
    }

    black_box(IdleOutcome {
        sum,
        floating,
        ticks,
        bursts,
    })
}

fn burst(profile: &IdleProfile, sum: &mut u64, floating: &mut f64) {
    for i in 0..profile.burst_len {
        let i = black_box(u64::from(i));
        if profile.fenced {
            spin_loop();
        }
        if i % 2 == 0 {
            *sum = sum.wrapping_add(i * 3);
            *floating *= 1.000_001;
        } else {
            *sum = sum.wrapping_sub(i * 2);
            *floating /= 1.000_001;
        }
        if profile.fenced {
            fence(Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short(probability: f64) -> IdleProfile {
        IdleProfile {
            window: Duration::from_millis(20),
            tick: Duration::from_millis(1),
            burst_probability: probability,
            burst_len: 100,
            fenced: false,
        }
    }

    #[test]
    fn never_bursts_at_zero_probability() {
        let mut rng = WorkloadRng::from_seed(1);
        let out = idle_phase(&mut rng, &short(0.0));
        assert_eq!(out.bursts, 0);
        assert_eq!(out.sum, 0);
        assert!(out.ticks >= 1);
    }

    #[test]
    fn bursts_every_tick_at_full_probability() {
        let mut rng = WorkloadRng::from_seed(1);
        let out = idle_phase(&mut rng, &short(1.0));
        assert_eq!(out.bursts, out.ticks);
        assert!(out.bursts >= 1);
    }

    #[test]
    fn phase_lasts_at_least_the_window() {
        let mut rng = WorkloadRng::from_seed(2);
        let profile = short(0.05);
        let start = Instant::now();
        idle_phase(&mut rng, &profile);
        assert!(start.elapsed() >= profile.window);
    }

    #[test]
    fn single_nap_profile_ticks_once() {
        let mut rng = WorkloadRng::from_seed(4);
        let profile = IdleProfile {
            window: Duration::from_millis(15),
            tick: Duration::from_millis(15),
            ..IdleProfile::single_nap()
        };
        let out = idle_phase(&mut rng, &profile);
        assert_eq!(out.ticks, 1);
    }

    #[test]
    fn four_step_burst_wraps_below_zero() {
        // steps 0 and 1: +0 then -2 wraps, steps 2 and 3: +6 then -6
        let mut sum = 0u64;
        let mut floating = 1.0;
        let profile = IdleProfile {
            burst_len: 4,
            ..short(1.0)
        };
        burst(&profile, &mut sum, &mut floating);
        assert_eq!(sum, 0u64.wrapping_sub(2));
        assert!((floating - 1.0).abs() < 1e-9);
    }
}
