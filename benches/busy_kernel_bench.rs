/*
Cost of a single busy-kernel pass over the 1024-element buffer, and of one idle burst
phase with a tiny window. Useful to calibrate how many passes fit into the one-second
busy window on a given host.
*/

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use active_idle::workload::{BusyBudget, IdleProfile, WorkloadRng, busy_phase, idle_phase};
use std::{hint::black_box, time::Duration};

fn bench_busy_passes(c: &mut Criterion) {
    let mut group = c.benchmark_group("busy_kernel");

    for passes in [1u32, 16, 128] {
        group.bench_with_input(BenchmarkId::new("passes", passes), &passes, |b, &passes| {
            let mut rng = WorkloadRng::from_seed(42);
            b.iter(|| black_box(busy_phase(&mut rng, BusyBudget::Passes(passes))));
        });
    }
    group.finish();
}

fn bench_idle_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("idle_kernel");
    group.sample_size(20);

    let profile = IdleProfile {
        window: Duration::from_millis(2),
        ..IdleProfile::ticking()
    };
    group.bench_function("ticking_2ms", |b| {
        let mut rng = WorkloadRng::from_seed(7);
        b.iter(|| black_box(idle_phase(&mut rng, &profile)));
    });
    group.finish();
}

criterion_group!(benches, bench_busy_passes, bench_idle_tick);
criterion_main!(benches);
