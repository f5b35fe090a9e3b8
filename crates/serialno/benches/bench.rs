use chrono::{NaiveDate, NaiveDateTime};
use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use serialno::{
    AcceptAll, Clock, CounterStore, GeneratorConfig, MemoryStore, NewFormat, Pattern,
    SerialService, ThreadSleep,
};
use std::{thread::scope, time::Instant};

// Serials generated per benchmark iteration (per-thread for multi-threaded).
const TOTAL_SERIALS: usize = 1024;

const PATTERN: &str = "INV-{DATE:yyyyMMdd}-{NUMBER:6}";

struct FixedMockTime;

impl Clock for FixedMockTime {
    fn now(&self) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 30)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap_or_default()
    }
}

fn service<S: CounterStore>(store: S) -> SerialService<S, FixedMockTime, ThreadSleep> {
    let service = SerialService::with_parts(
        store,
        FixedMockTime,
        ThreadSleep,
        GeneratorConfig::default(),
    );
    service
        .create_format(NewFormat::new("inv", "Invoices", PATTERN))
        .unwrap();
    service
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.throughput(Throughput::Elements(1));
    let at = FixedMockTime.now();

    group.bench_function("parse_and_render", |b| {
        b.iter(|| black_box(serialno::render(black_box(PATTERN), 42, at)));
    });

    let pattern = Pattern::parse(PATTERN);
    group.bench_function("render_parsed", |b| {
        b.iter(|| black_box(pattern.render(black_box(42), at)));
    });

    group.finish();
}

/// Sequential generation where every candidate is accepted.
fn bench_generate<S: CounterStore>(c: &mut Criterion, group_name: &str, factory: impl Fn() -> S) {
    let mut group = c.benchmark_group(group_name);
    group.throughput(Throughput::Elements(TOTAL_SERIALS as u64));

    group.bench_function(format!("elems/{TOTAL_SERIALS}"), |b| {
        b.iter_custom(|iters| {
            let mut elapsed = core::time::Duration::ZERO;
            for _ in 0..iters {
                let service = service(factory());
                let start = Instant::now();
                for _ in 0..TOTAL_SERIALS {
                    black_box(service.generate("inv", &AcceptAll).unwrap());
                }
                elapsed += start.elapsed();
            }
            elapsed
        });
    });

    group.finish();
}

/// Threads contending on one key, so every generation waits for the row lock.
fn bench_generate_contended(c: &mut Criterion) {
    let threads = 8;
    let mut group = c.benchmark_group("memory/contended");
    group.throughput(Throughput::Elements((TOTAL_SERIALS * threads) as u64));

    group.bench_function(format!("threads/{threads}"), |b| {
        b.iter_custom(|iters| {
            let mut elapsed = core::time::Duration::ZERO;
            for _ in 0..iters {
                let service = service(MemoryStore::new());
                let start = Instant::now();
                scope(|s| {
                    for _ in 0..threads {
                        s.spawn(|| {
                            for _ in 0..TOTAL_SERIALS {
                                black_box(service.generate("inv", &AcceptAll).unwrap());
                            }
                        });
                    }
                });
                elapsed += start.elapsed();
            }
            elapsed
        });
    });

    group.finish();
}

fn benchmark_memory_sequential(c: &mut Criterion) {
    bench_generate(c, "memory/sequential", MemoryStore::new);
}

#[cfg(feature = "redb")]
fn benchmark_redb_sequential(c: &mut Criterion) {
    // The temp dir must outlive the store, so keep each one alongside it.
    let dirs = std::cell::RefCell::new(Vec::new());
    bench_generate(c, "redb/sequential", || {
        let dir = tempfile::tempdir().unwrap();
        let store = serialno::RedbStore::open(dir.path().join("bench.redb")).unwrap();
        dirs.borrow_mut().push(dir);
        store
    });
}

#[cfg(feature = "redb")]
criterion_group!(
    benches,
    bench_render,
    benchmark_memory_sequential,
    bench_generate_contended,
    benchmark_redb_sequential,
);

#[cfg(not(feature = "redb"))]
criterion_group!(
    benches,
    bench_render,
    benchmark_memory_sequential,
    bench_generate_contended,
);

criterion_main!(benches);
