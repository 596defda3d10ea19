//! On-disk layout shared by the builder and the reader.
//!
//! ```text
//! offset 0                 TABLE_SIZE                     TABLE_SIZE + n * 17
//! | address table (LE u32) | suffix record 0 | ... | suffix record n-1 |
//! ```
//!
//! There is no magic number or version tag. Changing any constant below
//! invalidates every database built with the previous values, so builder and
//! reader must always ship together. [`crate::RangeDb::open`] checks that the
//! file length agrees with the table sentinel, which catches most mismatches.

use std::fmt::{self, Write};
use std::str::FromStr;

use crate::conversion::{parse_prefix, prefix_to_hex};
use crate::error::Error;

/// Number of hex characters in a prefix (24 bits).
pub const PREFIX_HEX_LEN: usize = 6;

/// Number of distinct prefixes (16^6 = 16,777,216).
pub const PREFIX_COUNT: u32 = 1 << 24;

/// Address table entries: one per prefix plus the end sentinel.
pub const TABLE_ENTRIES: usize = PREFIX_COUNT as usize + 1;

/// Width of a single address table entry in bytes.
pub const TABLE_ENTRY_SIZE: usize = 4;

/// Size of the address table at the start of the file (64 MiB + 4 bytes).
pub const TABLE_SIZE: u64 = (TABLE_ENTRIES * TABLE_ENTRY_SIZE) as u64;

/// Hex length of a full SHA-1 hash.
pub const HASH_HEX_LEN: usize = 40;

/// Hex length of the suffix that follows the prefix.
pub const SUFFIX_HEX_LEN: usize = HASH_HEX_LEN - PREFIX_HEX_LEN;

/// Suffix record width in bytes (136 bits).
pub const RECORD_SIZE: usize = SUFFIX_HEX_LEN / 2;

/// A suffix record as stored on disk.
pub type Record = [u8; RECORD_SIZE];

/// A 24-bit hash prefix, always below [`PREFIX_COUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Prefix(u32);

impl Prefix {
    pub const MIN: Prefix = Prefix(0);
    pub const MAX: Prefix = Prefix(PREFIX_COUNT - 1);

    #[inline]
    pub fn new(value: u32) -> Option<Self> {
        (value < PREFIX_COUNT).then_some(Prefix(value))
    }

    /// Parses exactly six hex digits, either case.
    pub fn from_hex(hex: &str) -> Result<Self, Error> {
        parse_prefix(hex.as_bytes()).map(Prefix).ok_or(Error::InvalidPrefix)
    }

    #[inline]
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        prefix_to_hex(self.0).iter().try_for_each(|&c| f.write_char(c as char))
    }
}

impl FromStr for Prefix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Prefix::from_hex(s)
    }
}

/// Byte offset of the record with the given zero-based index.
#[inline]
pub fn record_offset(index: u32) -> u64 {
    TABLE_SIZE + index as u64 * RECORD_SIZE as u64
}

/// Exact file length of a database holding `record_count` records.
#[inline]
pub fn expected_file_len(record_count: u32) -> u64 {
    record_offset(record_count)
}

/// Serializes the address table as little-endian u32s.
pub fn encode_table(table: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(table.len() * TABLE_ENTRY_SIZE);
    for entry in table {
        out.extend_from_slice(&entry.to_le_bytes());
    }
    out
}

/// Inverse of [`encode_table`]. Trailing bytes that do not form a full entry
/// are ignored.
pub fn decode_table(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(TABLE_ENTRY_SIZE)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
