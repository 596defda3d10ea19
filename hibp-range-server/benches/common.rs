use std::path::{Path, PathBuf};

use hibp_rangedb::{BuildConfig, db_path_from_env, generate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

/// Hashes in the synthetic database used when HIBP_RANGE_DB is unset.
pub const SYNTHETIC_HASHES: usize = 1_000_000;

/// Generates a sorted corpus of random SHA-1 hashes.
/// Uses a fixed seed for reproducible benchmark results.
pub fn generate_sorted_hashes(count: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut hashes: Vec<String> = (0..count)
        .map(|_| {
            let bytes: [u8; 20] = rng.r#gen();
            bytes.iter().map(|b| format!("{b:02X}")).collect()
        })
        .collect();
    hashes.sort_unstable();
    hashes
}

/// Generates random 6-character prefixes to query.
pub fn generate_random_prefixes(count: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..count).map(|_| format!("{:06x}", rng.gen_range(0..1u32 << 24))).collect()
}

/// Returns the database from HIBP_RANGE_DB, or builds a synthetic one.
///
/// The TempDir must outlive the benchmark when present.
pub fn bench_db() -> (Option<TempDir>, PathBuf) {
    if let Some(path) = db_path_from_env() {
        return (None, path);
    }

    let dir = TempDir::new().unwrap();
    let corpus = dir.path().join("corpus.txt");
    let db = dir.path().join("bench.db");
    write_corpus(&corpus, &generate_sorted_hashes(SYNTHETIC_HASHES));
    generate(&corpus, &db, &BuildConfig::default(), None).unwrap();
    (Some(dir), db)
}

fn write_corpus(path: &Path, hashes: &[String]) {
    let mut text = hashes.join("\n");
    text.push('\n');
    std::fs::write(path, text).unwrap();
}
