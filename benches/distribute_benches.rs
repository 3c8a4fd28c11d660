use criterion::{criterion_group, criterion_main, Criterion};
use rand::Rng;

use polyspring_core::Corpus;

fn random_rows(n: usize) -> Vec<(u32, Vec<Vec<f64>>)> {
    let mut rng = rand::thread_rng();
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|_| vec![rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)])
        .collect();
    vec![(0, rows)]
}

fn distribute_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("distribute");
    for &n in &[100usize, 500, 2000] {
        group.bench_function(format!("n={n}"), |b| {
            b.iter_batched(
                || Corpus::new(random_rows(n), 0, 1).unwrap(),
                |mut corpus| corpus.distribute(0, None).unwrap(),
                criterion::BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, distribute_benchmark);
criterion_main!(benches);
