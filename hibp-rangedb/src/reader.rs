//! Read side of the database: an immutable address table plus positioned
//! reads of the suffix records.
//!
//! A [`RangeDb`] is `Send + Sync` and is meant to be shared behind an `Arc`.
//! Lookups never touch a shared file cursor, so any number of threads can
//! query it at once without locking.

use std::fs::File;
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::conversion::encode_suffix;
use crate::error::{Error, Result};
use crate::format::{
    PREFIX_COUNT, Prefix, RECORD_SIZE, Record, TABLE_ENTRIES, TABLE_SIZE, decode_table,
    expected_file_len, record_offset,
};

/// Bytes of address table decoded per read at open (a multiple of 4)
const TABLE_READ_CHUNK: usize = 1 << 20;

/// Prefix to record-index map, loaded once and never mutated.
#[derive(Debug)]
pub struct AddressTable {
    entries: Box<[u32]>,
}

impl AddressTable {
    /// Validates and wraps a decoded table.
    ///
    /// The table must have exactly `2^24 + 1` entries, start at zero and be
    /// non-decreasing.
    pub fn from_entries(entries: Vec<u32>) -> Result<Self> {
        if entries.len() != TABLE_ENTRIES {
            return Err(Error::Corrupt(format!(
                "address table has {} entries, expected {}",
                entries.len(),
                TABLE_ENTRIES
            )));
        }
        if entries[0] != 0 {
            return Err(Error::Corrupt(format!("address table starts at {}", entries[0])));
        }
        if let Some(i) = entries.windows(2).position(|w| w[0] > w[1]) {
            return Err(Error::Corrupt(format!(
                "address table decreases at prefix {:06x} ({} > {})",
                i + 1,
                entries[i],
                entries[i + 1]
            )));
        }
        Ok(Self { entries: entries.into_boxed_slice() })
    }

    /// Record indices holding hashes that start with `prefix`.
    #[inline]
    pub fn range(&self, prefix: Prefix) -> Range<u32> {
        let p = prefix.value() as usize;
        self.entries[p]..self.entries[p + 1]
    }

    /// Total records in the database (the sentinel entry).
    #[inline]
    pub fn record_count(&self) -> u32 {
        self.entries[PREFIX_COUNT as usize]
    }

    /// Number of prefixes with at least one record.
    pub fn prefixes_present(&self) -> u32 {
        self.entries.windows(2).filter(|w| w[0] != w[1]).count() as u32
    }
}

/// An open, read-only database file.
#[derive(Debug)]
pub struct RangeDb {
    path: PathBuf,
    file: File,
    table: AddressTable,
}

impl RangeDb {
    /// Opens the database at `path` and loads its address table.
    ///
    /// Fails if the file is shorter than the table, if the table is not
    /// monotonic, or if the file length disagrees with the record count
    /// stored in the sentinel entry.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|source| Error::Open { path: path.to_path_buf(), source })?;

        let len = file.metadata()?.len();
        if len < TABLE_SIZE {
            return Err(Error::Truncated { len });
        }

        let table = load_table(&file)?;

        let expected = expected_file_len(table.record_count());
        if len != expected {
            return Err(Error::Corrupt(format!(
                "file is {} bytes but its table describes {} records ({} bytes)",
                len,
                table.record_count(),
                expected
            )));
        }

        debug!("Loaded address table from {:?}, {} records", path, table.record_count());

        Ok(Self { path: path.to_path_buf(), file, table })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &AddressTable {
        &self.table
    }

    pub fn record_count(&self) -> u32 {
        self.table.record_count()
    }

    /// Returns every suffix record under `prefix`, in ascending order.
    ///
    /// An absent prefix yields an empty vector without touching the file.
    pub fn lookup(&self, prefix: Prefix) -> Result<Vec<Record>> {
        let range = self.table.range(prefix);
        let count = (range.end - range.start) as usize;
        if count == 0 {
            return Ok(Vec::new());
        }

        let mut buf = vec![0u8; count * RECORD_SIZE];
        read_exact_at(&self.file, &mut buf, record_offset(range.start))?;

        Ok(buf
            .chunks_exact(RECORD_SIZE)
            .map(|chunk| {
                let mut record = [0u8; RECORD_SIZE];
                record.copy_from_slice(chunk);
                record
            })
            .collect())
    }

    /// Parses a 6-character hex prefix and returns the matching suffixes as
    /// lower-case hex strings.
    pub fn lookup_hex(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = Prefix::from_hex(prefix)?;
        Ok(self.lookup(prefix)?.iter().map(encode_suffix).collect())
    }
}

fn load_table(file: &File) -> Result<AddressTable> {
    let mut entries = Vec::with_capacity(TABLE_ENTRIES);
    let mut buf = vec![0u8; TABLE_READ_CHUNK];
    let mut offset = 0u64;
    while offset < TABLE_SIZE {
        let n = (TABLE_SIZE - offset).min(TABLE_READ_CHUNK as u64) as usize;
        read_exact_at(file, &mut buf[..n], offset)?;
        entries.extend(decode_table(&buf[..n]));
        offset += n as u64;
    }
    AddressTable::from_entries(entries)
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

// seek_read moves the handle's cursor but nothing here relies on it.
#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ));
            }
            Ok(n) => {
                buf = &mut std::mem::take(&mut buf)[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
