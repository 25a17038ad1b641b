use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use idhunt::{Alphabet, CandidateGenerator, IdLength, RunStats};
use std::{sync::Arc, thread::scope};

// Number of candidates generated per benchmark iteration (per-thread for
// multi-threaded).
const TOTAL_IDS: usize = 4096;

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    for len in [1, 11, 100] {
        let mut generator =
            CandidateGenerator::new(Alphabet::default(), IdLength::new(len).unwrap());
        group.bench_function(format!("len/{len}"), |b| {
            b.iter(|| {
                for _ in 0..TOTAL_IDS {
                    black_box(generator.generate());
                }
            });
        });
    }

    group.finish();
}

fn bench_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("stats");
    let threads = 4;
    group.throughput(Throughput::Elements((TOTAL_IDS * threads) as u64));

    group.bench_function(format!("threads/{threads}"), |b| {
        b.iter(|| {
            let stats = Arc::new(RunStats::new());
            scope(|s| {
                for _ in 0..threads {
                    let stats = Arc::clone(&stats);
                    s.spawn(move || {
                        for _ in 0..TOTAL_IDS {
                            stats.record_check();
                            stats.record_miss();
                        }
                    });
                }
            });
            black_box(stats.snapshot());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_generate, bench_stats);
criterion_main!(benches);
