//! lifecycle.rs
//! Spawns the worker threads, turns the calling thread into the coordinator, joins
//! everyone and assembles the run summary.
//!
//! Marker order on the trace:
//! roi_start, run_begin("begin"), [per thread: thread name, then its phase markers],
//! run_end("end"), roi_end. Nothing is emitted if the configuration is rejected.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Instant,
};

use core_affinity::{CoreId, get_core_ids, set_for_current};
use log::{debug, info, warn};

use crate::{
    config::RunConfiguration,
    coordination::{StartBarrier, termination_pair},
    error::{Result, WorkloadError},
    instrumentation::{Instrumentation, MarkerKind},
    scheduler::phase::{PhaseOutcome, PhaseScheduler, ThreadContext},
    utils::metrics::RunSummary,
    workload::WorkloadRng,
};

pub const RUN_BEGIN_LABEL: &str = "begin";
pub const RUN_END_LABEL: &str = "end";

/// Runs one complete workload on `config.threads` threads and blocks until all of them
/// have left their phase loops.
///
/// Thread 0 is the calling thread. A failure to spawn any worker is fatal: the workers
/// already started stay parked on the barrier and the caller is expected to exit.
pub fn run_workload(
    config: &RunConfiguration,
    instrumentation: Arc<dyn Instrumentation>,
) -> Result<RunSummary> {
    config.validate()?;

    let threads = config.threads;
    let cpus = num_cpus::get();
    if threads > cpus {
        warn!(
            "[Lifecycle] {} threads requested on {} logical CPUs; phases will be time-sliced",
            threads, cpus
        );
    }

    let cores = if config.pin_cores {
        let cores = get_core_ids().unwrap_or_default();
        if cores.is_empty() {
            warn!("[Lifecycle] core pinning requested but no core ids are available");
        }
        cores
    } else {
        Vec::new()
    };

    let barrier = Arc::new(StartBarrier::new(threads)?);
    let (signal, watch) = termination_pair();

    info!(
        "[Lifecycle] starting {} thread(s), policy: {}",
        threads, config.policy
    );
    let run_start = Instant::now();
    instrumentation.roi_start();
    instrumentation.named_marker(MarkerKind::RunBegin, RUN_BEGIN_LABEL);

    let mut handles: Vec<(usize, JoinHandle<PhaseOutcome>)> = Vec::with_capacity(threads - 1);
    for id in 1..threads {
        let ctx = ThreadContext::new(id);
        let name = ctx.name().to_string();
        let scheduler = PhaseScheduler::worker(
            ctx,
            config.policy,
            config.phases,
            instrumentation.clone(),
            watch.clone(),
        );
        let barrier = barrier.clone();
        let core = core_for(&cores, id);
        let seed = config.seed;

        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || enter_phase_loop(scheduler, &barrier, core, seed))
            .map_err(|source| WorkloadError::ThreadSpawn { id, source })?;
        handles.push((id, handle));
    }

    let coordinator = PhaseScheduler::coordinator(
        config.policy,
        config.phases,
        instrumentation.clone(),
        signal,
    );
    let lead = enter_phase_loop(coordinator, &barrier, core_for(&cores, 0), config.seed);

    let timed_region = lead.timed_region;
    let mut reports = Vec::with_capacity(threads);
    reports.push(lead.report);
    for (id, handle) in handles {
        let outcome = handle
            .join()
            .map_err(|_| WorkloadError::WorkerPanicked { id })?;
        debug!("[Lifecycle] joined thread{} after {} cycles", id, outcome.report.cycles);
        reports.push(outcome.report);
    }

    instrumentation.named_marker(MarkerKind::RunEnd, RUN_END_LABEL);
    instrumentation.roi_end();

    let summary = RunSummary {
        threads,
        policy: config.policy,
        timed_region,
        elapsed: run_start.elapsed(),
        barrier_arrivals: barrier.arrivals(),
        termination_raised: watch.raise_count() > 0,
        reports,
    };
    info!(
        "[Lifecycle] all threads joined: {} cycles in {:.3}s",
        summary.total_cycles(),
        summary.elapsed.as_secs_f64()
    );
    Ok(summary)
}

fn core_for(cores: &[CoreId], id: usize) -> Option<CoreId> {
    if cores.is_empty() {
        None
    } else {
        cores.get(id % cores.len()).copied()
    }
}

// Per-thread prologue: name, optional pinning, private RNG, then the phase loop.
fn enter_phase_loop(
    scheduler: PhaseScheduler,
    barrier: &StartBarrier,
    core: Option<CoreId>,
    seed: Option<u64>,
) -> PhaseOutcome {
    let ctx = scheduler.context().clone();
    scheduler.instrumentation().set_thread_name(ctx.name());

    if let Some(core) = core {
        if set_for_current(core) {
            debug!("[{}] pinned to core {:?}", ctx.name(), core);
        } else {
            warn!("[{}] failed to set affinity", ctx.name());
        }
    }

    let mut rng = WorkloadRng::for_thread(ctx.id(), seed);
    debug!("[{}] rng seed {:#x}", ctx.name(), rng.seed());
    scheduler.run(barrier, &mut rng)
}
