//! Command-line interface definition for csv-grep
//!
//! Provides argument parsing and the conversions from raw option strings to
//! the typed values the processor works with.

use crate::error::Result;
use crate::input::{parse_separator, CsvFormat};
use crate::output::{OutputFormat, OutputTarget};
use clap::{ArgAction, Parser};
use log::LevelFilter;
use std::path::PathBuf;

/// Grep delimited text files by composite key
#[derive(Parser, Debug, Clone)]
#[command(
    name = "csv-grep",
    author = "m0h1nd4",
    version,
    about = "Grep CSV files by key. Multiple key columns supported.",
    long_about = r#"
Grep CSV files by key. Multiple key columns supported.

Rows whose key matches one of the patterns are written to the output. A key
is built from one or more columns (-k 1,3 joins trimmed columns 1 and 3 with
"_"). Patterns come from -p, from a pattern file (-f, key columns -K), or both.

EXAMPLES:
    # Rows whose first column is "ABC"
    csv-grep -p ABC data.csv

    # Keys from column 2 of ids.csv, matched against columns 1 and 3
    csv-grep -f ids.csv -K 2 -k 1,3 data.csv

    # Drop known ids from a TSV with a title row
    csv-grep -t -H -i -f blacklist.txt data.tsv

    # Regex search, each pattern used at most once
    csv-grep -r -d -f prefixes.txt -o hits.csv part1.csv part2.csv
"#
)]
pub struct Args {
    /// Input file(s); STDIN when none is given or for "-"
    #[arg(value_name = "FILE")]
    pub input: Vec<PathBuf>,

    /// Output file (default: STDOUT)
    #[arg(short, long, value_name = "FILE")]
    pub outfile: Option<PathBuf>,

    /// Key column(s) of the input, comma separated
    #[arg(short, long, value_name = "COLUMNS", default_value = "1")]
    pub key: String,

    /// Ignore the title row of every input
    #[arg(short = 'H', long, default_value_t = false)]
    pub ignore_title: bool,

    /// Field separator
    #[arg(short = 'F', long, value_name = "CHAR", default_value = ",")]
    pub fs: String,

    /// Field separator of the output (default: same as --fs)
    #[arg(long, value_name = "CHAR")]
    pub fs_out: Option<String>,

    /// Quote character
    #[arg(short = 'Q', long, value_name = "CHAR", default_value = "\"")]
    pub qc: String,

    /// Field separator and quote character are both TAB (no quoting)
    #[arg(short = 't', long, default_value_t = false)]
    pub tab: bool,

    /// Query pattern
    #[arg(short, long, value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// Pattern file
    #[arg(short = 'f', long, value_name = "FILE")]
    pub pattern_file: Option<PathBuf>,

    /// Key column(s) of the pattern file, comma separated
    #[arg(short = 'K', long, value_name = "COLUMNS", default_value = "1")]
    pub pattern_key: String,

    /// Patterns are regular expressions
    #[arg(short, long, default_value_t = false)]
    pub regexp: bool,

    /// Delete a pattern once it matched a row
    #[arg(short = 'd', long, default_value_t = false)]
    pub speedup: bool,

    /// Invert match: keep rows that do not match
    #[arg(short, long, default_value_t = false)]
    pub invert: bool,

    /// Input encoding: "auto" or a label such as utf-8, latin1, gbk
    #[arg(long, value_name = "LABEL", default_value = "auto")]
    pub encoding: String,

    /// Output buffer size
    #[arg(long, value_name = "SIZE", default_value = "8MB")]
    pub buffer_size: String,

    /// Show a row counter on stderr
    #[arg(long, default_value_t = false)]
    pub progress: bool,

    /// Quiet mode - no summary
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Verbosity: -v info, -vv debug, -vvv trace
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Input delimiter and quoting; `--tab` overrides `--fs` and `--qc`
    pub fn input_format(&self) -> Result<CsvFormat> {
        if self.tab {
            return Ok(CsvFormat::tab());
        }

        Ok(CsvFormat {
            delimiter: parse_separator("field separator", &self.fs)?,
            quote: parse_separator("quote char", &self.qc)?,
            quoting: true,
        })
    }

    pub fn output_format(&self, input: &CsvFormat) -> Result<OutputFormat> {
        let delimiter = self
            .fs_out
            .as_deref()
            .map(|fs| parse_separator("output field separator", fs))
            .transpose()?;

        Ok(OutputFormat::from_input(input, delimiter))
    }

    pub fn output_target(&self) -> OutputTarget {
        match self.outfile {
            Some(ref path) if path.as_os_str() != "-" => OutputTarget::File(path.clone()),
            _ => OutputTarget::Stdout,
        }
    }

    /// Parse buffer size string to bytes
    pub fn parse_buffer_size(&self) -> anyhow::Result<usize> {
        parse_size(&self.buffer_size)
    }

    /// Log level for the verbosity count
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Parse human-readable size string to bytes
fn parse_size(size_str: &str) -> anyhow::Result<usize> {
    let size_str = size_str.trim().to_uppercase();

    let (num_str, multiplier) = if let Some(n) = size_str.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = size_str.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = size_str.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = size_str.strip_suffix('B') {
        (n, 1)
    } else {
        (size_str.as_str(), 1)
    };

    let num: usize = num_str
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid size format: '{}'", size_str))?;

    if num == 0 {
        anyhow::bail!("Buffer size must be greater than zero: '{}'", size_str);
    }

    num.checked_mul(multiplier)
        .ok_or_else(|| anyhow::anyhow!("Buffer size too large: '{}'", size_str))
}
