//! Marker / region-of-interest interface consumed by the scheduler.
//!
//! The simulator that records the trace owns the real implementation; the scheduler only
//! calls through `Instrumentation`. Marker codes are part of the contract with the
//! consuming simulator and must not change.
//!
//! Sinks provided here:
//! - [`recorder::TraceRecorder`]: lock-free queue drained to a CSV trace by a background thread.
//! - [`log_sink::LogInstrumentation`]: writes markers through `log` (default).
//! - [`memory::MemoryTrace`]: ordered in-memory list, for tests and benches.

pub mod log_sink;
pub mod memory;
pub mod recorder;

pub use log_sink::LogInstrumentation;
pub use memory::MemoryTrace;
pub use recorder::{TraceRecorder, TraceRow, TraceStats, read_trace};

/// Stable marker codes shared with the consuming simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MarkerKind {
    BusyBegin = 1,
    BusyEnd = 2,
    IdleBegin = 3,
    IdleEnd = 4,
    RunBegin = 5,
    RunEnd = 6,
}

impl MarkerKind {
    pub const ALL: [MarkerKind; 6] = [
        MarkerKind::BusyBegin,
        MarkerKind::BusyEnd,
        MarkerKind::IdleBegin,
        MarkerKind::IdleEnd,
        MarkerKind::RunBegin,
        MarkerKind::RunEnd,
    ];

    #[inline]
    pub const fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            MarkerKind::BusyBegin => "busy_begin",
            MarkerKind::BusyEnd => "busy_end",
            MarkerKind::IdleBegin => "idle_begin",
            MarkerKind::IdleEnd => "idle_end",
            MarkerKind::RunBegin => "run_begin",
            MarkerKind::RunEnd => "run_end",
        }
    }

    pub fn is_begin(self) -> bool {
        matches!(
            self,
            MarkerKind::BusyBegin | MarkerKind::IdleBegin | MarkerKind::RunBegin
        )
    }

    pub fn is_end(self) -> bool {
        !self.is_begin()
    }
}

/// Calls the scheduler makes into the trace-recording side.
///
/// Implementations must be cheap and must not block for long: they are called from inside
/// the timed region by every thread.
pub trait Instrumentation: Send + Sync {
    /// Opens the measured region. Coordinator only, once per run.
    fn roi_start(&self);
    /// Closes the measured region. Coordinator only, once per run.
    fn roi_end(&self);
    /// Display name of the calling thread; called once per thread before its phase loop.
    fn set_thread_name(&self, name: &str);
    /// Phase boundary of `thread_id`.
    fn marker(&self, kind: MarkerKind, thread_id: usize);
    /// Run boundary with a human-readable label.
    fn named_marker(&self, kind: MarkerKind, label: &str);
}

/// One call into [`Instrumentation`], as recorded by the in-process sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    RoiStart,
    RoiEnd,
    ThreadName(String),
    Marker { kind: MarkerKind, thread_id: usize },
    NamedMarker { kind: MarkerKind, label: String },
}

impl TraceEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            TraceEvent::RoiStart => "roi_start",
            TraceEvent::RoiEnd => "roi_end",
            TraceEvent::ThreadName(_) => "thread_name",
            TraceEvent::Marker { kind, .. } | TraceEvent::NamedMarker { kind, .. } => kind.name(),
        }
    }

    pub fn kind(&self) -> Option<MarkerKind> {
        match self {
            TraceEvent::Marker { kind, .. } | TraceEvent::NamedMarker { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn thread_id(&self) -> Option<usize> {
        match self {
            TraceEvent::Marker { thread_id, .. } => Some(*thread_id),
            _ => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            TraceEvent::ThreadName(name) => Some(name),
            TraceEvent::NamedMarker { label, .. } => Some(label),
            _ => None,
        }
    }
}
