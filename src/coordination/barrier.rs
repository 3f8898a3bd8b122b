//! barrier.rs
//! Reusable rendezvous for a fixed number of parties.
//!
//! Arrivals are counted under a mutex. The last arrival resets the count, advances the
//! generation and wakes everyone; earlier arrivals sleep until the generation they
//! arrived in has ended. Waiting on the generation (not the count) keeps back-to-back
//! episodes from stealing each other's wakeups and ignores spurious wakeups.

use std::sync::atomic::{AtomicU64, Ordering};

use log::trace;
use parking_lot::{Condvar, Mutex};

use crate::error::{Result, WorkloadError};

#[derive(Debug)]
struct BarrierState {
    arrived: usize,
    generation: u64,
}

#[derive(Debug)]
pub struct StartBarrier {
    state: Mutex<BarrierState>,
    released: Condvar,
    parties: usize,
    arrivals: AtomicU64,
}

/// What one caller learned from passing the barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierWaitResult {
    /// True for exactly one caller per episode: the one whose arrival released the rest.
    pub leader: bool,
    /// Episode this caller took part in, starting at 0.
    pub generation: u64,
}

impl StartBarrier {
    pub fn new(parties: usize) -> Result<Self> {
        if parties == 0 {
            return Err(WorkloadError::InvalidThreadCount(parties));
        }
        Ok(Self {
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
            }),
            released: Condvar::new(),
            parties,
            arrivals: AtomicU64::new(0),
        })
    }

    /// Blocks until `parties` callers (this one included) have arrived in the current episode.
    pub fn wait(&self) -> BarrierWaitResult {
        let mut state = self.state.lock();
        self.arrivals.fetch_add(1, Ordering::Relaxed);

        let generation = state.generation;
        state.arrived += 1;

        if state.arrived == self.parties {
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.released.notify_all();
            trace!("[Barrier] episode {} released {} parties", generation, self.parties);
            return BarrierWaitResult {
                leader: true,
                generation,
            };
        }

        while state.generation == generation {
            self.released.wait(&mut state);
        }

        BarrierWaitResult {
            leader: false,
            generation,
        }
    }

    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Total `wait` calls over the barrier's lifetime.
    pub fn arrivals(&self) -> u64 {
        self.arrivals.load(Ordering::Relaxed)
    }

    /// Number of completed episodes.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Callers currently blocked in the open episode.
    pub fn waiting(&self) -> usize {
        self.state.lock().arrived
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::{TryRecvError, unbounded};
    use std::{
        sync::{Arc, atomic::AtomicUsize},
        thread,
        time::Duration,
    };

    #[test]
    fn zero_parties_rejected() {
        assert!(matches!(
            StartBarrier::new(0),
            Err(WorkloadError::InvalidThreadCount(0))
        ));
    }

    #[test]
    fn single_party_never_blocks() {
        let barrier = StartBarrier::new(1).unwrap();
        for expected in 0..3 {
            let r = barrier.wait();
            assert!(r.leader);
            assert_eq!(r.generation, expected);
        }
        assert_eq!(barrier.generation(), 3);
        assert_eq!(barrier.arrivals(), 3);
    }

    #[test]
    fn nobody_passes_before_the_last_arrival() {
        let barrier = Arc::new(StartBarrier::new(10).unwrap());
        let (tx, rx) = unbounded();

        let handles: Vec<_> = (0..9)
            .map(|_| {
                let b = barrier.clone();
                let tx = tx.clone();
                thread::spawn(move || {
                    b.wait();
                    tx.send(()).unwrap();
                })
            })
            .collect();

        while barrier.waiting() < 9 {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));

        let r = barrier.wait();
        assert!(r.leader);
        for _ in 0..9 {
            rx.recv().unwrap();
        }
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn repeated_episodes_release_everyone_once() {
        const PARTIES: usize = 6;
        const EPISODES: usize = 200;

        let barrier = Arc::new(StartBarrier::new(PARTIES).unwrap());
        let arrived = Arc::new(AtomicUsize::new(0));
        let leaders = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..PARTIES)
            .map(|_| {
                let b = barrier.clone();
                let arrived = arrived.clone();
                let leaders = leaders.clone();
                thread::spawn(move || {
                    for episode in 0..EPISODES {
                        arrived.fetch_add(1, Ordering::SeqCst);
                        let r = b.wait();
                        // Everyone of this episode must have arrived before anyone left.
                        assert!(arrived.load(Ordering::SeqCst) >= (episode + 1) * PARTIES);
                        // Nobody from the next episode can be released yet.
                        assert!(arrived.load(Ordering::SeqCst) <= (episode + 2) * PARTIES);
                        assert_eq!(r.generation, episode as u64);
                        if r.leader {
                            leaders.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(leaders.load(Ordering::SeqCst), EPISODES);
        assert_eq!(barrier.generation(), EPISODES as u64);
        assert_eq!(barrier.arrivals(), (PARTIES * EPISODES) as u64);
        assert_eq!(barrier.waiting(), 0);
    }
}
