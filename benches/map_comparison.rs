use core::hint::black_box;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::Criterion;
use criterion::Throughput;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use trihash::HashMap as TriHashMap;
use trihash::HashUint;

const SIZES: &[usize] = &[
    ((1 << 10) as f32 * 0.7) as usize,
    ((1 << 14) as f32 * 0.7) as usize,
    ((1 << 18) as f32 * 0.7) as usize,
];

/// Spread sequential keys over the hash range so identity hashing probes
/// realistically instead of filling buckets in order.
fn spread(i: usize) -> u32 {
    (i as u32).wrapping_mul(2_654_435_761)
}

fn shuffled_keys(size: usize, seed: u64) -> Vec<u32> {
    let mut keys: Vec<u32> = (0..size).map(spread).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(seed));
    keys
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for &size in SIZES {
        let keys = shuffled_keys(size, 1);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("trihash/{}", size), |b| {
            b.iter(|| {
                let mut map: TriHashMap<u32, u32> = TriHashMap::new();
                for &key in &keys {
                    map.set(key, key).unwrap();
                }
                black_box(map)
            })
        });
        group.bench_function(format!("trihash_preallocated/{}", size), |b| {
            b.iter(|| {
                let mut map: TriHashMap<u32, u32> =
                    TriHashMap::with_capacity(size as HashUint).unwrap();
                for &key in &keys {
                    map.set(key, key).unwrap();
                }
                black_box(map)
            })
        });
        group.bench_function(format!("hashbrown/{}", size), |b| {
            b.iter(|| {
                let mut map: hashbrown::HashMap<u32, u32> = hashbrown::HashMap::new();
                for &key in &keys {
                    map.insert(key, key);
                }
                black_box(map)
            })
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_hit");

    for &size in SIZES {
        let keys = shuffled_keys(size, 2);
        group.throughput(Throughput::Elements(size as u64));

        let mut tri: TriHashMap<u32, u32> = TriHashMap::new();
        let mut brown: hashbrown::HashMap<u32, u32> = hashbrown::HashMap::new();
        for &key in &keys {
            tri.set(key, key).unwrap();
            brown.insert(key, key);
        }

        group.bench_function(format!("trihash/{}", size), |b| {
            b.iter(|| {
                let mut found = 0u32;
                for key in &keys {
                    if tri.get(key).is_some() {
                        found += 1;
                    }
                }
                black_box(found)
            })
        });
        group.bench_function(format!("hashbrown/{}", size), |b| {
            b.iter(|| {
                let mut found = 0u32;
                for key in &keys {
                    if brown.get(key).is_some() {
                        found += 1;
                    }
                }
                black_box(found)
            })
        });
    }

    group.finish();
}

fn bench_lookup_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup_miss");

    for &size in SIZES {
        let keys = shuffled_keys(size, 3);
        let missing: Vec<u32> = (size..2 * size).map(spread).collect();
        group.throughput(Throughput::Elements(size as u64));

        let mut tri: TriHashMap<u32, u32> = TriHashMap::new();
        let mut brown: hashbrown::HashMap<u32, u32> = hashbrown::HashMap::new();
        for &key in &keys {
            tri.set(key, key).unwrap();
            brown.insert(key, key);
        }

        group.bench_function(format!("trihash/{}", size), |b| {
            b.iter(|| {
                let mut found = 0u32;
                for key in &missing {
                    if tri.get(key).is_some() {
                        found += 1;
                    }
                }
                black_box(found)
            })
        });
        group.bench_function(format!("hashbrown/{}", size), |b| {
            b.iter(|| {
                let mut found = 0u32;
                for key in &missing {
                    if brown.get(key).is_some() {
                        found += 1;
                    }
                }
                black_box(found)
            })
        });
    }

    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove");

    for &size in SIZES {
        let keys = shuffled_keys(size, 4);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("trihash/{}", size), |b| {
            b.iter_batched(
                || {
                    let mut map: TriHashMap<u32, u32> = TriHashMap::new();
                    for &key in &keys {
                        map.set(key, key).unwrap();
                    }
                    map
                },
                |mut map| {
                    for key in &keys {
                        black_box(map.remove(key));
                    }
                    map
                },
                criterion::BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("hashbrown/{}", size), |b| {
            b.iter_batched(
                || {
                    let mut map: hashbrown::HashMap<u32, u32> = hashbrown::HashMap::new();
                    for &key in &keys {
                        map.insert(key, key);
                    }
                    map
                },
                |mut map| {
                    for key in &keys {
                        black_box(map.remove(key));
                    }
                    map
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_string_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_keys");

    for &size in &SIZES[..2] {
        let keys: Vec<String> = (0..size).map(|i| format!("key_{}", spread(i))).collect();
        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("trihash/{}", size), |b| {
            b.iter(|| {
                let mut map: TriHashMap<String, u32> = TriHashMap::new();
                for (i, key) in keys.iter().enumerate() {
                    map.set(key.clone(), i as u32).unwrap();
                }
                let mut found = 0u32;
                for key in &keys {
                    if map.get(key).is_some() {
                        found += 1;
                    }
                }
                black_box(found)
            })
        });
        group.bench_function(format!("hashbrown/{}", size), |b| {
            b.iter(|| {
                let mut map: hashbrown::HashMap<String, u32> = hashbrown::HashMap::new();
                for (i, key) in keys.iter().enumerate() {
                    map.insert(key.clone(), i as u32);
                }
                let mut found = 0u32;
                for key in &keys {
                    if map.get(key).is_some() {
                        found += 1;
                    }
                }
                black_box(found)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_insert,
    bench_lookup,
    bench_lookup_miss,
    bench_remove,
    bench_string_keys
);
criterion_main!(benches);
