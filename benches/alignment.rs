use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dna_aligner::{clean, Aligner, AlignmentMode, WorkerPool};
use std::sync::Arc;

fn generate_test_sequence(length: usize, shift: usize) -> String {
    let pattern = b"ATCGGATCCA";
    (0..length)
        .map(|i| pattern[(i * 7 + shift) % pattern.len()] as char)
        .collect()
}

fn bench_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("pairwise");
    for &len in &[100usize, 500, 1000] {
        let a = clean(&generate_test_sequence(len, 0)).unwrap();
        let b = clean(&generate_test_sequence(len, 3)).unwrap();

        for mode in [AlignmentMode::Global, AlignmentMode::Local] {
            let aligner = Aligner::default().with_alignment_mode(mode);
            group.bench_with_input(BenchmarkId::new(mode.to_string(), len), &len, |bench, _| {
                bench.iter(|| black_box(aligner.align_sequences(black_box(&a), black_box(&b))))
            });
        }
    }
    group.finish();
}

fn bench_pool(c: &mut Criterion) {
    let query = Arc::new(clean(&generate_test_sequence(300, 0)).unwrap());
    let targets: Vec<_> = (0..32)
        .map(|k| Arc::new(clean(&generate_test_sequence(300, k)).unwrap()))
        .collect();
    let aligner = Aligner::default().with_alignment_mode(AlignmentMode::Local);
    let mut pool = WorkerPool::with_default_size().unwrap();

    c.bench_function("pool_32x300bp", |bench| {
        bench.iter(|| {
            let pairs = targets.iter().map(|t| (Arc::clone(&query), Arc::clone(t)));
            black_box(pool.align_all(&aligner, pairs).unwrap())
        })
    });
}

criterion_group!(benches, bench_modes, bench_pool);
criterion_main!(benches);
