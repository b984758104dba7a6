//! Output management module
//!
//! Kept rows are re-encoded with minimal quoting and the output delimiter,
//! through a buffered writer to a file or STDOUT.

use crate::error::{GrepError, Result};
use crate::input::CsvFormat;
use csv::{QuoteStyle, StringRecord};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default buffer size for output writing (8MB)
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024 * 1024;

/// Encoding of output rows
#[derive(Debug, Clone, Copy)]
pub struct OutputFormat {
    pub delimiter: u8,
    pub quote: u8,
    pub quote_style: QuoteStyle,
}

impl OutputFormat {
    /// Output format for an input format, with an optional delimiter override
    pub fn from_input(input: &CsvFormat, delimiter: Option<u8>) -> Self {
        let quote_style = if input.quoting {
            QuoteStyle::Necessary
        } else {
            QuoteStyle::Never
        };

        Self {
            delimiter: delimiter.unwrap_or(input.delimiter),
            quote: if input.quoting { input.quote } else { b'"' },
            quote_style,
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::from_input(&CsvFormat::default(), None)
    }
}

/// Where kept rows go
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputTarget {
    #[default]
    Stdout,
    File(PathBuf),
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("<stdout>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Row writer with a count of rows written
pub struct RowWriter<W: Write> {
    writer: csv::Writer<W>,
    rows_written: u64,
}

impl RowWriter<Box<dyn Write>> {
    /// Open the output target with a write buffer of `buffer_size` bytes
    pub fn create(target: &OutputTarget, format: &OutputFormat, buffer_size: usize) -> Result<Self> {
        let inner: Box<dyn Write> = match target {
            OutputTarget::Stdout => Box::new(BufWriter::with_capacity(buffer_size, io::stdout().lock())),
            OutputTarget::File(path) => {
                ensure_parent_dir(path)?;
                let file = File::create(path).map_err(|source| GrepError::Open {
                    path: path.clone(),
                    source,
                })?;
                Box::new(BufWriter::with_capacity(buffer_size, file))
            }
        };

        Ok(Self::new(inner, format))
    }
}

impl<W: Write> RowWriter<W> {
    pub fn new(inner: W, format: &OutputFormat) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(format.delimiter)
            .quote(format.quote)
            .quote_style(format.quote_style)
            .flexible(true)
            .from_writer(inner);

        Self {
            writer,
            rows_written: 0,
        }
    }

    pub fn write_row(&mut self, row: &StringRecord) -> Result<()> {
        self.writer.write_record(row)?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| GrepError::Io(e.into_error()))
    }
}

/// Create the parent directory of an output file if missing
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
