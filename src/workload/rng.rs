//! Per-thread pseudo-random source for the workload kernels.
//!
//! Seeded from wall-clock seconds mixed with the thread id (or from a fixed base seed for
//! reproducible runs). Owned by exactly one thread; never shared.

use rand::{Rng, SeedableRng, rngs::SmallRng};
use std::time::{SystemTime, UNIX_EPOCH};

const ID_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

pub struct WorkloadRng {
    inner: SmallRng,
    seed: u64,
}

impl WorkloadRng {
    /// Seed for `thread_id`, taken from `base` when given, otherwise from the clock.
    pub fn for_thread(thread_id: usize, base: Option<u64>) -> Self {
        let base = base.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs()
        });
        Self::from_seed(mix_seed(base, thread_id))
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform integer in `[lo, hi]`.
    #[inline]
    pub fn value_in(&mut self, lo: i32, hi: i32) -> i32 {
        self.inner.random_range(lo..=hi)
    }

    /// True with probability `p` (clamped to `[0, 1]`).
    #[inline]
    pub fn chance(&mut self, p: f64) -> bool {
        self.inner.random_bool(p.clamp(0.0, 1.0))
    }
}

fn mix_seed(base: u64, thread_id: usize) -> u64 {
    base.wrapping_add((thread_id as u64).wrapping_mul(ID_MIX))
}
