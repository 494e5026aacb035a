//! Quick benchmarks for development feedback (~20 seconds).
//!
//! Run with:
//! ```
//! cargo bench --bench bench_quick
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use projline::beeswarm::Beeswarm;
use projline::diagnostics::NullSink;
use projline::query::{self, ActiveCounter};
use projline::test_support::{generate_api_export, generate_projects, generate_sheet_rows};
use projline::Timeline;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;
use std::time::Duration;

// =============================================================================
// RECONCILE BENCHMARKS
// =============================================================================

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("quick/reconcile");
    group.sample_size(10);
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    for count in [500usize, 5_000] {
        let export = generate_api_export(count, 42);
        let rows = generate_sheet_rows(&export, count * 2, 42);
        group.throughput(Throughput::Elements((count * 3) as u64));
        group.bench_with_input(
            BenchmarkId::new("api+sheet", format!("{count}_projects")),
            &(export, rows),
            |b, (export, rows)| b.iter(|| black_box(Timeline::reconcile(export, rows, &mut NullSink))),
        );
    }

    group.finish();
}

// =============================================================================
// ACTIVE COUNT BENCHMARKS
// =============================================================================

fn bench_active_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("quick/active_count");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(3));

    let projects = generate_projects(10_000, 7);
    let counter = ActiveCounter::new(&projects);
    let days = counter
        .extent()
        .map(|span| span.sample_dates(1))
        .unwrap_or_default();

    group.throughput(Throughput::Elements(days.len() as u64));
    group.bench_function("linear_scan", |b| {
        b.iter(|| {
            days.iter()
                .map(|&day| query::active_count(&projects, day))
                .sum::<usize>()
        })
    });
    group.bench_function("sorted_bounds", |b| {
        b.iter(|| days.iter().map(|&day| counter.count(day)).sum::<usize>())
    });
    group.bench_function("series", |b| b.iter(|| black_box(query::series(&projects, 1))));

    group.finish();
}

// =============================================================================
// PACKING BENCHMARKS
// =============================================================================

fn bench_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("quick/pack");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(3));

    let mut rng = StdRng::seed_from_u64(9);
    let swarm = Beeswarm::new(3.0).unwrap();
    for count in [1_000usize, 20_000] {
        let positions: Vec<f64> = (0..count).map(|_| rng.random_range(0.0..1_000.0)).collect();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("dodge", count), &positions, |b, positions| {
            b.iter(|| black_box(swarm.pack(positions).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reconcile, bench_active_count, bench_pack);
criterion_main!(benches);
