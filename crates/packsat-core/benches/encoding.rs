use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use packsat_core::encoding::enumerator::enumerate;
use packsat_core::{clausify, Encoder, Instance};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn random_instance(items: usize, dimension: usize, seed: u64) -> Instance {
    let mut rng = StdRng::seed_from_u64(seed);
    Instance::random(&mut rng, items, dimension).expect("random instances are well formed")
}

fn bench_enumerate(c: &mut Criterion) {
    let mut group = c.benchmark_group("enumerate");
    for n in [8, 14, 20] {
        let instance = random_instance(n, 1, 42);
        let capacity = instance.container().capacity(1);
        group.bench_with_input(BenchmarkId::from_parameter(n), &instance, |b, instance| {
            b.iter(|| black_box(enumerate(1, black_box(instance.items()), capacity).ok()))
        });
    }
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let encoder = Encoder::new();
    let mut group = c.benchmark_group("encode");
    for n in [5, 10, 20] {
        let instance = random_instance(n, 2, 7);
        group.bench_with_input(BenchmarkId::from_parameter(n), &instance, |b, instance| {
            b.iter(|| black_box(encoder.encode(black_box(instance)).ok()))
        });
    }
    group.finish();
}

fn bench_clausify(c: &mut Criterion) {
    let instance = random_instance(12, 2, 11);
    let encoding = Encoder::new().encode(&instance).expect("encoding succeeds");

    c.bench_function("clausify_12_items", |b| {
        b.iter(|| black_box(clausify(black_box(&encoding)).len()))
    });
}

criterion_group!(benches, bench_enumerate, bench_encode, bench_clausify);
criterion_main!(benches);
