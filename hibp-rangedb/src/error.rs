use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to parse line {line}: {content:?}")]
    MalformedInput { line: u64, content: String },

    #[error("Line {line}: prefix {prefix:06x} follows {previous:06x}, input is not sorted by hash")]
    UnsortedInput { line: u64, prefix: u32, previous: u32 },

    #[error("Corpus holds more than {} hashes", u32::MAX)]
    TooManyRecords,

    #[error("Failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database is {len} bytes, shorter than its address table")]
    Truncated { len: u64 },

    #[error("Corrupt database: {0}")]
    Corrupt(String),

    #[error("prefix should be the first 6 characters of the SHA-1 password")]
    InvalidPrefix,
}

pub type Result<T> = std::result::Result<T, Error>;
