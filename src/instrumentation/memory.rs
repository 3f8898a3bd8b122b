//! In-memory sink. Every call is appended under one lock, so the list is a total order of
//! what all threads emitted.

use parking_lot::Mutex;

use crate::instrumentation::{Instrumentation, MarkerKind, TraceEvent};

#[derive(Debug, Default)]
pub struct MemoryTrace {
    events: Mutex<Vec<TraceEvent>>,
}

impl MemoryTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Phase markers emitted by one thread, in emission order.
    pub fn markers_for(&self, thread_id: usize) -> Vec<MarkerKind> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                TraceEvent::Marker { kind, thread_id: t } if *t == thread_id => Some(*kind),
                _ => None,
            })
            .collect()
    }

    /// Occurrences of `kind` across all threads, named markers included.
    pub fn count(&self, kind: MarkerKind) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind() == Some(kind))
            .count()
    }

    /// Position of the first event matching `pred`.
    pub fn position(&self, pred: impl Fn(&TraceEvent) -> bool) -> Option<usize> {
        self.events.lock().iter().position(pred)
    }

    fn push(&self, event: TraceEvent) {
        self.events.lock().push(event);
    }
}

impl Instrumentation for MemoryTrace {
    fn roi_start(&self) {
        self.push(TraceEvent::RoiStart);
    }

    fn roi_end(&self) {
        self.push(TraceEvent::RoiEnd);
    }

    fn set_thread_name(&self, name: &str) {
        self.push(TraceEvent::ThreadName(name.to_string()));
    }

    fn marker(&self, kind: MarkerKind, thread_id: usize) {
        self.push(TraceEvent::Marker { kind, thread_id });
    }

    fn named_marker(&self, kind: MarkerKind, label: &str) {
        self.push(TraceEvent::NamedMarker {
            kind,
            label: label.to_string(),
        });
    }
}
