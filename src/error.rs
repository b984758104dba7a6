//! Error types for csv-grep
//!
//! Every fatal condition of a run maps to one variant here. None of them is
//! recoverable per row: a bad key column is a misconfiguration, not bad data.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, GrepError>;

#[derive(Debug, Error)]
pub enum GrepError {
    /// Neither a literal pattern nor a non-empty pattern file was given
    #[error("no pattern given. Please check pattern file: {pattern_file}")]
    NoPattern { pattern_file: String },

    /// A key column points past the end of a row
    #[error("key ({key}) is beyond number of column ({columns})")]
    KeyBeyondColumns { key: usize, columns: usize },

    #[error("invalid key column spec '{spec}': {reason}")]
    InvalidKeySpec { spec: String, reason: String },

    #[error("invalid {name} '{value}': expected a single ASCII character")]
    InvalidDelimiter { name: &'static str, value: String },

    #[error("invalid regex pattern '{pattern}'")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown encoding label '{0}'")]
    UnknownEncoding(String),

    #[error("failed to open {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed delimited input")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}
