use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use avl_map::AvlTreeMap;

const N: usize = 100_000;

pub fn benchmarks(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let values: Vec<i32> = (1..=N).map(|_| rng.gen()).collect();

    c.bench_function("map_insert", |b| {
        let mut map = AvlTreeMap::new();
        b.iter(|| {
            for value in &values {
                map.insert(*value, *value);
            }
        })
    });

    let mut map = AvlTreeMap::new();
    for value in &values {
        map.insert(*value, *value);
    }

    c.bench_function("map_get", |b| {
        b.iter(|| {
            for value in &values {
                black_box(map.get(value));
            }
        })
    });

    c.bench_function("map_iter", |b| {
        b.iter(|| {
            for (k, v) in &map {
                black_box((k, v));
            }
        })
    });

    c.bench_function("map_remove", |b| {
        b.iter_batched(
            || map.clone(),
            |mut map| {
                for value in &values {
                    map.remove(value);
                }
                map
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

// Time to fill an empty map with n random keys, for growing n.
pub fn insert_series(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_fill");
    let mut size = 10;
    while size < 1_000_000 {
        let mut rng = StdRng::seed_from_u64(size as u64);
        let values: Vec<i32> = (0..size).map(|_| rng.gen_range(0..100_000_000)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &values, |b, values| {
            b.iter(|| {
                let mut map = AvlTreeMap::new();
                for value in values {
                    map.insert(*value, *value);
                }
                map
            })
        });
        size *= 5;
    }
    group.finish();
}

criterion_group!(benches, benchmarks, insert_series);
criterion_main!(benches);
