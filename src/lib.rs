//! # csv-grep
//!
//! Grep delimited text files (CSV, TSV, ...) by a composite key.
//!
//! ## Features
//!
//! - **Composite keys**: key built from one or more trimmed columns, joined with `_`
//! - **Pattern sources**: a literal pattern, a pattern file, or both
//! - **Regex patterns**: pre-compiled, searched anywhere in the key
//! - **Speedup mode**: each pattern matches at most one row, reading stops once all are used
//! - **Invert match**: keep the rows that do not match
//! - **Encoding detection**: non-UTF-8 input is transcoded before decoding
//!
//! ## Usage
//!
//! ```bash
//! # Rows whose first column is "ABC"
//! csv-grep -p ABC data.csv
//!
//! # Keys from column 2 of ids.csv, matched against columns 1 and 3
//! csv-grep -f ids.csv -K 2 -k 1,3 data.csv
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use csv_grep::input::InputSource;
//! use csv_grep::processor::{Processor, ProcessorConfig};
//! use std::path::PathBuf;
//!
//! let config = ProcessorConfig {
//!     inputs: vec![InputSource::File(PathBuf::from("data.csv"))],
//!     pattern: Some("ABC".to_string()),
//!     key: "1,3".parse().unwrap(),
//!     ..Default::default()
//! };
//!
//! let mut processor = Processor::new(config).unwrap();
//! let stats = processor.process().unwrap();
//! println!("{}", stats.summary_line());
//! ```

pub mod cli;
pub mod encoding;
pub mod error;
pub mod filter;
pub mod input;
pub mod key;
pub mod output;
pub mod pattern;
pub mod processor;
pub mod progress;

pub use cli::Args;
pub use error::{GrepError, Result};
pub use processor::{Processor, ProcessorConfig};
