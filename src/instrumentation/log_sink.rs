//! Default sink: every call becomes a `log` record under the `marker` target.
//! Enable with `RUST_LOG=marker=trace`.

use log::{debug, trace};

use crate::instrumentation::{Instrumentation, MarkerKind};

#[derive(Debug, Default, Clone, Copy)]
pub struct LogInstrumentation;

impl Instrumentation for LogInstrumentation {
    fn roi_start(&self) {
        debug!(target: "marker", "roi_start");
    }

    fn roi_end(&self) {
        debug!(target: "marker", "roi_end");
    }

    fn set_thread_name(&self, name: &str) {
        debug!(target: "marker", "thread_name {}", name);
    }

    fn marker(&self, kind: MarkerKind, thread_id: usize) {
        trace!(target: "marker", "[thread{}] {} ({})", thread_id, kind.name(), kind.code());
    }

    fn named_marker(&self, kind: MarkerKind, label: &str) {
        debug!(target: "marker", "{} ({}) \"{}\"", kind.name(), kind.code(), label);
    }
}
