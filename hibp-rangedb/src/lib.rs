//! Builds and reads a prefix-indexed database of Have I Been Pwned SHA-1
//! hashes, for serving k-anonymity range queries.
//!
//! A client sends the first 6 hex characters (24 bits) of a password hash and
//! gets back every known hash suffix under that prefix, then checks for its
//! own hash locally. The server never learns which password was checked.
//!
//! # Binary Format
//!
//! One file, two parts:
//!
//! - An address table of `2^24 + 1` little-endian `u32`s. Entry `p` is the
//!   index of the first record whose prefix is `>= p`; the last entry is the
//!   total record count.
//! - Fixed 17-byte records (the 136 bits after the prefix), in ascending hash
//!   order.
//!
//! The records for prefix `p` are `table[p]..table[p + 1]`, so a lookup is two
//! array reads plus one positioned read of `count * 17` bytes. Trading 64 MiB
//! of memory for the table avoids a binary search per request.
//!
//! # Building
//!
//! The input is the official "ordered by hash" SHA-1 dump: one hash per line,
//! sorted ascending. Anything after the 40th character (such as the
//! `:count` column) is ignored.
//!
//! ```no_run
//! use std::path::Path;
//! use hibp_rangedb::{BuildConfig, RangeDb, generate};
//!
//! generate(
//!     Path::new("pwned-passwords-sha1-ordered-by-hash-v8.txt"),
//!     Path::new("pwned-passwords.db"),
//!     &BuildConfig::default(),
//!     None,
//! )?;
//!
//! let db = RangeDb::open("pwned-passwords.db")?;
//! let suffixes = db.lookup_hex("CBFDAC")?;
//! # Ok::<(), hibp_rangedb::Error>(())
//! ```

use std::path::PathBuf;

pub mod builder;
pub mod conversion;
pub mod error;
pub mod format;
pub mod reader;

pub use builder::{BuildConfig, BuildStats, build, generate};
pub use conversion::{decode_suffix, encode_suffix, hex_to_nibble, parse_prefix, prefix_to_hex};
pub use error::{Error, Result};
pub use format::{PREFIX_COUNT, Prefix, RECORD_SIZE, Record, TABLE_SIZE};
pub use reader::{AddressTable, RangeDb};

/// Environment variable naming a generated database, used by benches and
/// the dataset tests.
pub const HIBP_RANGE_DB_ENV: &str = "HIBP_RANGE_DB";

/// Returns the database path from the HIBP_RANGE_DB environment variable.
pub fn db_path_from_env() -> Option<PathBuf> {
    std::env::var_os(HIBP_RANGE_DB_ENV).map(PathBuf::from)
}
