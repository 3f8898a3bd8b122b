//! termination.rs
//! Single-writer, many-reader shutdown flag.
//!
//! `termination_pair` hands out one `TerminationSignal` (owned by the coordinator) and a
//! cloneable `TerminationWatch` for everyone else. `raise` consumes the signal, so the flag
//! can flip false -> true at most once and only through the coordinator.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use crossbeam::utils::CachePadded;

#[derive(Debug)]
struct Shared {
    // Polled by every thread once per cycle; keep it off the raise counter's line.
    stop: CachePadded<AtomicBool>,
    raises: AtomicUsize,
}

/// Write side. Not `Clone`.
#[derive(Debug)]
pub struct TerminationSignal {
    shared: Arc<Shared>,
}

/// Read side.
#[derive(Debug, Clone)]
pub struct TerminationWatch {
    shared: Arc<Shared>,
}

pub fn termination_pair() -> (TerminationSignal, TerminationWatch) {
    let shared = Arc::new(Shared {
        stop: CachePadded::new(AtomicBool::new(false)),
        raises: AtomicUsize::new(0),
    });
    (
        TerminationSignal {
            shared: shared.clone(),
        },
        TerminationWatch { shared },
    )
}

impl TerminationSignal {
    /// Publishes the stop request. Release pairs with the Acquire in `is_raised`.
    pub fn raise(self) {
        self.shared.raises.fetch_add(1, Ordering::Relaxed);
        self.shared.stop.store(true, Ordering::Release);
    }

    pub fn watch(&self) -> TerminationWatch {
        TerminationWatch {
            shared: self.shared.clone(),
        }
    }
}

impl TerminationWatch {
    #[inline]
    pub fn is_raised(&self) -> bool {
        self.shared.stop.load(Ordering::Acquire)
    }

    /// How many times the flag was written. Never exceeds 1.
    pub fn raise_count(&self) -> usize {
        self.shared.raises.load(Ordering::Relaxed)
    }
}
