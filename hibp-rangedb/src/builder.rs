use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use crate::conversion::{decode_suffix, parse_prefix};
use crate::error::{Error, Result};
use crate::format::{
    HASH_HEX_LEN, PREFIX_HEX_LEN, RECORD_SIZE, TABLE_ENTRIES, TABLE_SIZE, encode_table,
};

/// Lines between clock checks for progress reporting
const PROGRESS_CHECK_LINES: u32 = 0x10000;

/// Table entries encoded per write when the address table is flushed
const TABLE_WRITE_CHUNK: usize = 0x10000;

/// Longest slice of an offending line echoed back in errors
const MAX_ERROR_LINE: usize = 80;

/// Tuning knobs for [`generate`] and [`build`].
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Read buffer for the corpus (default: 16MB)
    pub read_buffer_size: usize,

    /// Write buffer for suffix records (default: 16MB)
    pub write_buffer_size: usize,

    /// Minimum time between progress log lines (default: 10s)
    pub progress_interval: Duration,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: 16 * 1024 * 1024,
            write_buffer_size: 16 * 1024 * 1024,
            progress_interval: Duration::from_secs(10),
        }
    }
}

/// Summary of a finished build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    /// Suffix records written, equal to the table sentinel
    pub records: u32,
    /// Distinct prefixes seen in the corpus
    pub prefixes_present: u32,
    pub elapsed: Duration,
}

/// Build a database at `dst` from the hash-ordered corpus at `src`.
///
/// `dst` is created or truncated. On error it is left half-written and must
/// be deleted; there is no resumable build.
#[instrument(skip(config, progress))]
pub fn generate(
    src: &Path,
    dst: &Path,
    config: &BuildConfig,
    progress: Option<&AtomicU64>,
) -> Result<BuildStats> {
    info!("Generating DB {:?} from {:?}...", dst, src);

    let source =
        File::open(src).map_err(|source| Error::Open { path: src.to_path_buf(), source })?;
    let db = File::create(dst).map_err(|source| Error::Open { path: dst.to_path_buf(), source })?;

    let reader = BufReader::with_capacity(config.read_buffer_size, source);
    let stats = build(reader, &db, config, progress)?;
    db.sync_all()?;

    info!(
        "DB generated, contains {} hashes across {} prefixes ({:.1?})",
        stats.records, stats.prefixes_present, stats.elapsed
    );
    Ok(stats)
}

/// Stream a sorted corpus from `reader` and write the database to `sink`.
///
/// The address table region is skipped first and written last, so the
/// suffix records only pass through memory once.
pub fn build<R, W>(
    mut reader: R,
    mut sink: W,
    config: &BuildConfig,
    progress: Option<&AtomicU64>,
) -> Result<BuildStats>
where
    R: BufRead,
    W: Write + Seek,
{
    let started = Instant::now();
    let mut addresses = vec![0u32; TABLE_ENTRIES];

    sink.seek(SeekFrom::Start(TABLE_SIZE))?;
    let mut writer = BufWriter::with_capacity(config.write_buffer_size, sink);

    let mut count = 0u32;
    let mut previous_prefix = 0u32;
    let mut prefixes_present = 0u32;
    let mut line_no = 0u64;
    let mut line = Vec::with_capacity(128);
    let mut record = [0u8; RECORD_SIZE];

    let mut timer = Instant::now();
    let mut timer_count = 0u32;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        line_no += 1;

        let text = trim_line_end(&line);
        if text.len() < HASH_HEX_LEN {
            return Err(malformed(line_no, text));
        }

        let prefix =
            parse_prefix(&text[..PREFIX_HEX_LEN]).ok_or_else(|| malformed(line_no, text))?;

        if count == 0 || prefix != previous_prefix {
            if prefix < previous_prefix {
                return Err(Error::UnsortedInput {
                    line: line_no,
                    prefix,
                    previous: previous_prefix,
                });
            }
            // Prefixes without hashes point at the next present one, i.e. an
            // empty range.
            addresses[previous_prefix as usize + 1..=prefix as usize].fill(count);
            previous_prefix = prefix;
            prefixes_present += 1;
        }

        decode_suffix(&text[PREFIX_HEX_LEN..HASH_HEX_LEN], &mut record)
            .ok_or_else(|| malformed(line_no, text))?;
        writer.write_all(&record)?;

        count = next_count(count)?;

        if count % PROGRESS_CHECK_LINES == 0 {
            if let Some(p) = progress {
                p.store(count as u64, Ordering::Relaxed);
            }
            if timer.elapsed() >= config.progress_interval {
                info!("Parsed {} hashes, total: {}", count - timer_count, count);
                timer_count = count;
                timer = Instant::now();
            }
        }
    }

    let mut sink = writer.into_inner().map_err(|e| e.into_error())?;

    // Everything above the last prefix, including the sentinel, ends at `count`.
    addresses[previous_prefix as usize + 1..].fill(count);

    debug!("Writing address table ({} entries)", addresses.len());
    sink.seek(SeekFrom::Start(0))?;
    for chunk in addresses.chunks(TABLE_WRITE_CHUNK) {
        sink.write_all(&encode_table(chunk))?;
    }
    sink.flush()?;

    if let Some(p) = progress {
        p.store(count as u64, Ordering::Relaxed);
    }

    Ok(BuildStats { records: count, prefixes_present, elapsed: started.elapsed() })
}

/// Record offsets are u32 on disk; past that the format cannot address them.
#[inline]
fn next_count(count: u32) -> Result<u32> {
    count.checked_add(1).ok_or(Error::TooManyRecords)
}

#[inline]
fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn malformed(line: u64, text: &[u8]) -> Error {
    let shown = &text[..text.len().min(MAX_ERROR_LINE)];
    Error::MalformedInput { line, content: String::from_utf8_lossy(shown).into_owned() }
}
