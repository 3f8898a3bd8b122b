//! recorder.rs
//! CSV trace sink: non-blocking queue in the hot path, background writer thread off it.
//!
//! Producers (every phase thread) push onto a bounded `ArrayQueue` and return. A single
//! consumer thread drains the queue in batches, serialises rows with `csv`, and flushes
//! every few batches to keep syscalls off the phase threads' timeline.
//!
//! A trace with holes is useless to the simulator, so a full queue applies backpressure
//! instead of dropping. Events are only lost if the writer thread has died; those are
//! counted and reported by `finish`.

use std::{
    fs::File,
    io::{self, BufWriter},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossbeam::utils::Backoff;
use crossbeam_queue::ArrayQueue;
use csv::Writer;
use log::{debug, error};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, WorkloadError},
    instrumentation::{Instrumentation, MarkerKind, TraceEvent},
};

const TRACE_CAPACITY: usize = 16_384; // Bounded queue size
const CONSUMER_POLL_MS: u64 = 5; // Consumer sleep when the queue is empty
const DRAIN_BATCH: usize = 256; // Events popped per poll
const FLUSH_BATCHES: usize = 8; // Batches written between flushes

#[derive(Debug)]
struct RawEvent {
    ts_ns: u64,
    event: TraceEvent,
}

/// One row of the trace file. `seq` is the order in which the writer dequeued the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRow {
    pub seq: u64,
    pub ts_ns: u64,
    pub event: String,
    pub code: Option<u32>,
    pub thread_id: Option<usize>,
    pub label: Option<String>,
}

impl TraceRow {
    fn from_raw(seq: u64, raw: &RawEvent) -> Self {
        Self {
            seq,
            ts_ns: raw.ts_ns,
            event: raw.event.event_name().to_string(),
            code: raw.event.kind().map(MarkerKind::code),
            thread_id: raw.event.thread_id(),
            label: raw.event.label().map(str::to_string),
        }
    }

    pub fn kind(&self) -> Option<MarkerKind> {
        self.code.and_then(MarkerKind::from_code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraceStats {
    pub written: u64,
    pub dropped: u64,
}

pub struct TraceRecorder {
    path: PathBuf,
    queue: Arc<ArrayQueue<RawEvent>>,
    run_start: Instant,
    stop: Arc<AtomicBool>,
    writer_alive: Arc<AtomicBool>,
    written: Arc<AtomicU64>,
    dropped: AtomicU64,
    consumer: Mutex<Option<JoinHandle<std::result::Result<(), csv::Error>>>>,
}

impl TraceRecorder {
    /// Creates (truncates) `path` and starts the writer thread.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path).map_err(|source| WorkloadError::TraceIo {
            path: path.clone(),
            source,
        })?;
        let wtr = Writer::from_writer(BufWriter::new(file));

        let queue = Arc::new(ArrayQueue::new(TRACE_CAPACITY));
        let stop = Arc::new(AtomicBool::new(false));
        let writer_alive = Arc::new(AtomicBool::new(true));
        let written = Arc::new(AtomicU64::new(0));

        let handle = {
            let queue = queue.clone();
            let stop = stop.clone();
            let alive = writer_alive.clone();
            let written = written.clone();
            thread::Builder::new()
                .name("trace-writer".into())
                .spawn(move || {
                    let result = drain_loop(wtr, &queue, &stop, &written);
                    alive.store(false, Ordering::Release);
                    if let Err(e) = &result {
                        error!("[TraceRecorder] writer failed: {}", e);
                    }
                    result
                })
                .map_err(|source| WorkloadError::TraceIo {
                    path: path.clone(),
                    source,
                })?
        };

        debug!("[TraceRecorder] writing trace to {:?}", path);
        Ok(Self {
            path,
            queue,
            run_start: Instant::now(),
            stop,
            writer_alive,
            written,
            dropped: AtomicU64::new(0),
            consumer: Mutex::new(Some(handle)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Nanoseconds since the recorder was created.
    #[inline]
    pub fn now_ns(&self) -> u64 {
        self.run_start.elapsed().as_nanos() as u64
    }

    fn record(&self, event: TraceEvent) {
        let mut raw = RawEvent {
            ts_ns: self.now_ns(),
            event,
        };
        let backoff = Backoff::new();
        loop {
            match self.queue.push(raw) {
                Ok(()) => return,
                Err(rejected) => raw = rejected,
            }
            if !self.writer_alive.load(Ordering::Acquire) {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return;
            }
            if backoff.is_completed() {
                thread::sleep(Duration::from_micros(100));
            } else {
                backoff.snooze();
            }
        }
    }

    /// Stops the writer after it has drained everything queued so far.
    /// Safe to call more than once; later calls just report the counters.
    pub fn finish(&self) -> Result<TraceStats> {
        self.stop.store(true, Ordering::Release);

        let handle = self.consumer.lock().take();
        if let Some(h) = handle {
            match h.join() {
                Ok(result) => result?,
                Err(_) => {
                    return Err(WorkloadError::TraceIo {
                        path: self.path.clone(),
                        source: io::Error::other("trace writer thread panicked"),
                    });
                }
            }
        }

        let stats = TraceStats {
            written: self.written.load(Ordering::Acquire),
            dropped: self.dropped.load(Ordering::Relaxed),
        };
        debug!(
            "[TraceRecorder] finished. written={} dropped={}",
            stats.written, stats.dropped
        );
        Ok(stats)
    }
}

fn drain_loop(
    mut wtr: Writer<BufWriter<File>>,
    queue: &ArrayQueue<RawEvent>,
    stop: &AtomicBool,
    written: &AtomicU64,
) -> std::result::Result<(), csv::Error> {
    let mut seq: u64 = 0;
    let mut flush_counter = 0usize;

    loop {
        let mut any = false;
        for _ in 0..DRAIN_BATCH {
            match queue.pop() {
                Some(raw) => {
                    any = true;
                    wtr.serialize(TraceRow::from_raw(seq, &raw))?;
                    seq += 1;
                }
                None => break,
            }
        }

        if any {
            written.store(seq, Ordering::Release);
            flush_counter += 1;
            if flush_counter >= FLUSH_BATCHES {
                wtr.flush()?;
                flush_counter = 0;
            }
        } else if stop.load(Ordering::Acquire) {
            break;
        } else {
            thread::sleep(Duration::from_millis(CONSUMER_POLL_MS));
        }
    }

    // Final drain: producers are gone once stop is set, but be exhaustive anyway
    while let Some(raw) = queue.pop() {
        wtr.serialize(TraceRow::from_raw(seq, &raw))?;
        seq += 1;
    }
    wtr.flush()?;
    written.store(seq, Ordering::Release);
    Ok(())
}

impl Instrumentation for TraceRecorder {
    fn roi_start(&self) {
        self.record(TraceEvent::RoiStart);
    }

    fn roi_end(&self) {
        self.record(TraceEvent::RoiEnd);
    }

    fn set_thread_name(&self, name: &str) {
        self.record(TraceEvent::ThreadName(name.to_string()));
    }

    fn marker(&self, kind: MarkerKind, thread_id: usize) {
        self.record(TraceEvent::Marker { kind, thread_id });
    }

    fn named_marker(&self, kind: MarkerKind, label: &str) {
        self.record(TraceEvent::NamedMarker {
            kind,
            label: label.to_string(),
        });
    }
}

impl Drop for TraceRecorder {
    fn drop(&mut self) {
        let _ = self.finish();
    }
}

/// Reads a trace file written by [`TraceRecorder`].
pub fn read_trace(path: impl AsRef<Path>) -> Result<Vec<TraceRow>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let rows = rdr.deserialize().collect::<std::result::Result<Vec<TraceRow>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_every_event_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.csv");

        let recorder = TraceRecorder::create(&path).unwrap();
        recorder.roi_start();
        recorder.named_marker(MarkerKind::RunBegin, "begin");
        recorder.set_thread_name("thread0");
        recorder.marker(MarkerKind::BusyBegin, 0);
        recorder.marker(MarkerKind::BusyEnd, 0);
        recorder.named_marker(MarkerKind::RunEnd, "end");
        recorder.roi_end();
        let stats = recorder.finish().unwrap();

        assert_eq!(stats, TraceStats { written: 7, dropped: 0 });

        let rows = read_trace(&path).unwrap();
        let events: Vec<&str> = rows.iter().map(|r| r.event.as_str()).collect();
        assert_eq!(
            events,
            vec![
                "roi_start",
                "run_begin",
                "thread_name",
                "busy_begin",
                "busy_end",
                "run_end",
                "roi_end"
            ]
        );
        assert!(rows.iter().enumerate().all(|(i, r)| r.seq == i as u64));
        assert_eq!(rows[1].code, Some(5));
        assert_eq!(rows[1].label.as_deref(), Some("begin"));
        assert_eq!(rows[2].label.as_deref(), Some("thread0"));
        assert_eq!(rows[3].thread_id, Some(0));
        assert_eq!(rows[3].kind(), Some(MarkerKind::BusyBegin));
        assert_eq!(rows[0].code, None);
    }

    #[test]
    fn concurrent_producers_lose_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trace.csv");
        let recorder = Arc::new(TraceRecorder::create(&path).unwrap());

        // More events than the queue holds, to exercise backpressure.
        const PER_THREAD: usize = 10_000;
        let handles: Vec<_> = (0..4)
            .map(|id| {
                let r = recorder.clone();
                thread::spawn(move || {
                    for _ in 0..PER_THREAD / 2 {
                        r.marker(MarkerKind::BusyBegin, id);
                        r.marker(MarkerKind::BusyEnd, id);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let stats = recorder.finish().unwrap();
        assert_eq!(stats.written, (4 * PER_THREAD) as u64);
        assert_eq!(stats.dropped, 0);

        let rows = read_trace(&path).unwrap();
        assert_eq!(rows.len(), 4 * PER_THREAD);
        for id in 0..4 {
            let kinds: Vec<_> = rows
                .iter()
                .filter(|r| r.thread_id == Some(id))
                .map(|r| r.kind().unwrap())
                .collect();
            assert!(kinds.chunks(2).all(|c| c == [MarkerKind::BusyBegin, MarkerKind::BusyEnd]));
        }
    }

    #[test]
    fn finish_twice_reports_same_counts() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = TraceRecorder::create(dir.path().join("t.csv")).unwrap();
        recorder.roi_start();
        let first = recorder.finish().unwrap();
        let second = recorder.finish().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unwritable_path_is_a_trace_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("trace.csv");
        assert!(matches!(
            TraceRecorder::create(&path),
            Err(WorkloadError::TraceIo { .. })
        ));
    }
}
