mod common;

use std::sync::Arc;

use common::{bench_db, generate_random_prefixes};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use hibp_rangedb::RangeDb;
use sha1::{Digest, Sha1};

// Commonly used passwords, all present in the real corpus
const COMMON_PASSWORDS: &[&str] = &[
    "123456",
    "password",
    "123456789",
    "qwerty",
    "password123",
    "abc123",
    "111111",
    "iloveyou",
    "admin",
    "dragon",
];

/// First 6 hex characters of the password's SHA-1, what a client would send.
fn password_prefix(password: &str) -> String {
    let hash: [u8; 20] = Sha1::digest(password.as_bytes()).into();
    format!("{:02x}{:02x}{:02x}", hash[0], hash[1], hash[2])
}

fn bench_common_passwords(c: &mut Criterion) {
    let (_dir, path) = bench_db();
    let db = RangeDb::open(&path).unwrap();
    let prefixes: Vec<String> = COMMON_PASSWORDS.iter().map(|p| password_prefix(p)).collect();

    c.bench_function("common_passwords_10", |b| {
        b.iter(|| {
            for prefix in &prefixes {
                black_box(db.lookup_hex(black_box(prefix)).unwrap());
            }
        })
    });
}

fn bench_random_prefixes(c: &mut Criterion) {
    let (_dir, path) = bench_db();
    let db = RangeDb::open(&path).unwrap();
    let prefixes = generate_random_prefixes(1000);

    c.bench_function("random_prefixes_1000", |b| {
        b.iter(|| {
            for prefix in &prefixes {
                black_box(db.lookup_hex(black_box(prefix)).unwrap());
            }
        })
    });
}

// Concurrent positioned reads on one shared handle
fn bench_concurrent_lookups(c: &mut Criterion) {
    let (_dir, path) = bench_db();
    let db = Arc::new(RangeDb::open(&path).unwrap());
    let prefixes = generate_random_prefixes(10_000);
    let threads = std::thread::available_parallelism().map_or(4, |n| n.get());

    c.bench_function("concurrent_lookups_10000", |b| {
        b.iter_batched(
            || prefixes.clone(),
            |prefixes| {
                std::thread::scope(|s| {
                    for chunk in prefixes.chunks(prefixes.len().div_ceil(threads)) {
                        let db = &db;
                        s.spawn(move || {
                            for prefix in chunk {
                                black_box(db.lookup_hex(prefix).unwrap());
                            }
                        });
                    }
                });
            },
            BatchSize::SmallInput,
        )
    });
}

// Address table load, the server's startup cost
fn bench_open(c: &mut Criterion) {
    let (_dir, path) = bench_db();

    c.bench_function("open_database", |b| b.iter(|| black_box(RangeDb::open(&path).unwrap())));
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = bench_common_passwords, bench_random_prefixes, bench_concurrent_lookups, bench_open
}
criterion_main!(benches);
