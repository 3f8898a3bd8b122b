//! busy.rs
//! CPU-bound phase kernel.
//!
//! A 1024-element buffer is filled with values in [-100, 100] and then scanned repeatedly.
//! Every element feeds a chain of data-dependent operations (multiplication, rotation,
//! threshold resets, sign/bit mutations of the buffer itself) so each pass depends on the
//! state left by the previous one and the branch mix keeps shifting.

use std::{
    hint::black_box,
    time::{Duration, Instant},
};

use crate::workload::rng::WorkloadRng;

pub const BUSY_BUFFER_LEN: usize = 1024;

const VALUE_MIN: i32 = -100;
const VALUE_MAX: i32 = 100;
const SUM_RESET_THRESHOLD: i64 = 1_000_000;

/// Range the floating accumulator is clamped to; leaving it resets the value to 1.0.
pub const FLOAT_MIN: f64 = 1e-10;
pub const FLOAT_MAX: f64 = 1e10;

/// How long one busy phase keeps scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyBudget {
    /// Scan until this much wall-clock time has passed.
    For(Duration),
    /// Scan exactly this many times.
    Passes(u32),
}

/// Final accumulator values of one busy phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusyOutcome {
    pub sum: u64,
    pub floating: f64,
    pub bits: u64,
    pub passes: u64,
    pub resets: u64,
}

impl BusyOutcome {
    /// Folds every accumulator into one word.
    pub fn checksum(&self) -> u64 {
        self.sum
            ^ self.bits.rotate_left(17)
            ^ self.floating.to_bits()
            ^ self.passes.wrapping_mul(31)
            ^ self.resets
    }
}

struct ScanState {
    sum: u64,
    floating: f64,
    bits: u64,
    passes: u64,
    resets: u64,
}

impl ScanState {
    fn new() -> Self {
        Self {
            sum: 0,
            floating: 1.0,
            bits: u64::MAX,
            passes: 0,
            resets: 0,
        }
    }

    fn pass(&mut self, buf: &mut [i32; BUSY_BUFFER_LEN]) {
        for i in 0..BUSY_BUFFER_LEN {
            let v = black_box(buf[i]);

            self.floating *= f64::from(v) / 100.0 + 1.0;
            if !(FLOAT_MIN..=FLOAT_MAX).contains(&self.floating) {
                self.floating = 1.0;
            }

            // v & 0x3F is always in 0..=63, including for negative v
            self.bits = self.bits.rotate_left((v & 0x3F) as u32);

            if v > 0 {
                let product = i64::from(v) * i64::from(buf[(i + 1) % BUSY_BUFFER_LEN]);
                self.sum = self.sum.wrapping_add(product as u64);
                self.sum ^= self.bits & 0xFFFF;
                if self.sum > SUM_RESET_THRESHOLD as u64 {
                    self.sum %= 100;
                    buf[i] = !buf[i];
                    self.resets += 1;
                }
            } else {
                let product = i64::from(v) * i64::from(buf[(i + 2) % BUSY_BUFFER_LEN]);
                self.sum = self.sum.wrapping_sub(product as u64);
                self.sum ^= (self.bits >> 32) & 0xFFFF;
                if (self.sum as i64) < -SUM_RESET_THRESHOLD {
                    self.sum = (self.sum as i64).unsigned_abs() % 100;
                    buf[i] = buf[i].wrapping_shl(1);
                    self.resets += 1;
                }
            }

            let neighbour = (i + 3) % BUSY_BUFFER_LEN;
            buf[neighbour] = if self.sum % 2 == 0 {
                buf[neighbour].wrapping_add(1)
            } else {
                buf[neighbour].wrapping_sub(1)
            };

            if (self.sum & 0xFF) > 128 {
                self.floating /= 1.01;
            } else {
                self.floating *= 1.01;
            }
        }
        self.passes += 1;
    }

    fn outcome(&self) -> BusyOutcome {
        BusyOutcome {
            sum: self.sum,
            floating: self.floating,
            bits: self.bits,
            passes: self.passes,
            resets: self.resets,
        }
    }
}

/// Runs one busy phase.
///
/// 1. **Fill:** the local buffer gets fresh values from the thread's RNG.
/// 2. **Scan:** the buffer is scanned until `budget` is spent; each pass mutates the buffer
///    so later passes take different branches.
/// 3. **Consume:** the accumulators are returned through `black_box`.
pub fn busy_phase(rng: &mut WorkloadRng, budget: BusyBudget) -> BusyOutcome {
    let mut buf = [0i32; BUSY_BUFFER_LEN];
    for slot in buf.iter_mut() {
        *slot = rng.value_in(VALUE_MIN, VALUE_MAX);
    }

    let mut state = ScanState::new();
    match budget {
        BusyBudget::For(window) => {
            let start = Instant::now();
            while start.elapsed() < window {
                state.pass(&mut buf);
            }
        }
        BusyBudget::Passes(n) => {
            for _ in 0..n {
                state.pass(&mut buf);
            }
        }
    }

    black_box(state.outcome())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_budget_is_exact() {
        let mut rng = WorkloadRng::from_seed(1);
        let out = busy_phase(&mut rng, BusyBudget::Passes(5));
        assert_eq!(out.passes, 5);
    }

    #[test]
    fn same_seed_same_outcome() {
        let a = busy_phase(&mut WorkloadRng::from_seed(11), BusyBudget::Passes(20));
        let b = busy_phase(&mut WorkloadRng::from_seed(11), BusyBudget::Passes(20));
        assert_eq!(a, b);
        assert_eq!(a.checksum(), b.checksum());
    }

    #[test]
    fn different_seeds_diverge() {
        let a = busy_phase(&mut WorkloadRng::from_seed(1), BusyBudget::Passes(3));
        let b = busy_phase(&mut WorkloadRng::from_seed(2), BusyBudget::Passes(3));
        assert_ne!(a.checksum(), b.checksum());
    }

    #[test]
    fn floating_stays_bounded_over_long_runs() {
        let mut rng = WorkloadRng::from_seed(5);
        for _ in 0..20 {
            let out = busy_phase(&mut rng, BusyBudget::Passes(50));
            // one trailing scale of 1.01 may push past the clamp before the next element
            assert!(out.floating.is_finite());
            assert!(out.floating >= FLOAT_MIN / 1.01);
            assert!(out.floating <= FLOAT_MAX * 1.01);
        }
    }

    #[test]
    fn timed_budget_runs_for_at_least_the_window() {
        let mut rng = WorkloadRng::from_seed(3);
        let window = Duration::from_millis(30);
        let start = Instant::now();
        let out = busy_phase(&mut rng, BusyBudget::For(window));
        assert!(start.elapsed() >= window);
        assert!(out.passes >= 1);
    }

    #[test]
    fn resets_fire_on_long_scans() {
        let mut rng = WorkloadRng::from_seed(8);
        let out = busy_phase(&mut rng, BusyBudget::Passes(200));
        assert!(out.resets > 0);
    }
}
