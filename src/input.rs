//! Input sources and row decoding
//!
//! Files and STDIN are opened the same way: a byte stream, transcoded to
//! UTF-8, decoded into rows by a `csv::Reader` built from a [`CsvFormat`].

use crate::encoding::{detect_encoding, transcoding_reader, InputEncoding};
use crate::error::{GrepError, Result};
use bytesize::ByteSize;
use csv::StringRecord;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Read buffer handed to the csv reader
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Field delimiter and quoting rules shared by main input and pattern file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvFormat {
    pub delimiter: u8,
    pub quote: u8,
    /// When false, quote characters are ordinary field content
    pub quoting: bool,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            quoting: true,
        }
    }
}

impl CsvFormat {
    /// Tab separated, quote char is tab as well, which turns quoting off
    pub fn tab() -> Self {
        Self {
            delimiter: b'\t',
            quote: b'\t',
            quoting: false,
        }
    }

    /// Row reader over `rdr`; blank lines come back as empty rows
    pub fn rows<R: Read>(&self, rdr: R) -> RowReader<R> {
        RowReader::new(self.reader(LineEndings::new(rdr)))
    }

    /// Plain csv reader: no header handling, ragged rows allowed
    fn reader<R: Read>(&self, rdr: R) -> csv::Reader<R> {
        csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .quote(self.quote)
            .quoting(self.quoting)
            .has_headers(false)
            .flexible(true)
            .buffer_capacity(READ_BUFFER_SIZE)
            .from_reader(rdr)
    }
}

/// Translates `\r\n` and lone `\r` to `\n` and remembers hitting EOF
pub struct LineEndings<R> {
    inner: R,
    after_cr: bool,
    eof: bool,
}

impl<R: Read> LineEndings<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            after_cr: false,
            eof: false,
        }
    }

    /// The inner reader has returned 0
    pub fn is_eof(&self) -> bool {
        self.eof
    }
}

impl<R: Read> Read for LineEndings<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            let n = self.inner.read(buf)?;
            if n == 0 {
                self.eof = true;
                return Ok(0);
            }

            let mut out = 0;
            for i in 0..n {
                let b = buf[i];
                if self.after_cr && b == b'\n' {
                    self.after_cr = false;
                    continue;
                }
                self.after_cr = b == b'\r';
                buf[out] = if b == b'\r' { b'\n' } else { b };
                out += 1;
            }

            // a chunk holding only the LF of a split CRLF is not EOF
            if out > 0 {
                return Ok(out);
            }
        }
    }
}

/// Rows of one source, blank lines included
///
/// The csv reader drops blank lines. They are recovered from the gap in
/// line numbers between consecutive records, minus the newlines inside
/// the record itself and its terminator.
pub struct RowReader<R: Read> {
    reader: csv::Reader<LineEndings<R>>,
    ahead: StringRecord,
    has_ahead: bool,
    blank_lines: u64,
    done: bool,
}

impl<R: Read> RowReader<R> {
    fn new(reader: csv::Reader<LineEndings<R>>) -> Self {
        Self {
            reader,
            ahead: StringRecord::new(),
            has_ahead: false,
            blank_lines: 0,
            done: false,
        }
    }

    /// Read the next row into `row`; a blank line leaves it empty
    ///
    /// Returns false once the source is exhausted.
    pub fn read_row(&mut self, row: &mut StringRecord) -> Result<bool> {
        loop {
            if self.blank_lines > 0 {
                self.blank_lines -= 1;
                row.clear();
                return Ok(true);
            }
            if self.has_ahead {
                self.has_ahead = false;
                std::mem::swap(row, &mut self.ahead);
                return Ok(true);
            }
            if self.done {
                return Ok(false);
            }
            self.fill()?;
        }
    }

    fn fill(&mut self) -> Result<()> {
        let before = self.reader.position().line();

        if self.reader.read_record(&mut self.ahead)? {
            let after = self.reader.position().line();
            let inner = self.ahead.as_slice().bytes().filter(|&b| b == b'\n').count() as u64;
            // only a last record without newline makes the reader see EOF
            let terminated = !self.reader.get_ref().is_eof();

            self.blank_lines = (after - before).saturating_sub(inner + u64::from(terminated));
            self.has_ahead = true;
        } else {
            self.blank_lines = self.reader.position().line().saturating_sub(before);
            self.done = true;
        }

        Ok(())
    }
}

/// Parse a delimiter or quote option into a single byte
///
/// Accepts one ASCII character, plus `\t` and `tab` for a tab.
pub fn parse_separator(name: &'static str, value: &str) -> Result<u8> {
    if matches!(value, "\\t" | "tab") {
        return Ok(b'\t');
    }

    match value.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(GrepError::InvalidDelimiter {
            name,
            value: value.to_string(),
        }),
    }
}

/// One input of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// Map command-line paths to sources; `-` or no path at all means STDIN
    pub fn from_paths(paths: &[PathBuf]) -> Vec<Self> {
        if paths.is_empty() {
            return vec![Self::Stdin];
        }

        paths
            .iter()
            .map(|p| {
                if p.as_os_str() == "-" {
                    Self::Stdin
                } else {
                    Self::File(p.clone())
                }
            })
            .collect()
    }

    /// Open the source as a UTF-8 byte stream
    pub fn open(&self, encoding: InputEncoding) -> Result<Box<dyn Read>> {
        match self {
            Self::Stdin => {
                log::info!("read data from STDIN");
                let encoding = match encoding {
                    InputEncoding::Auto => encoding_rs::UTF_8,
                    InputEncoding::Fixed(e) => e,
                };
                Ok(Box::new(transcoding_reader(io::stdin(), encoding)))
            }
            Self::File(path) => open_path(path, encoding),
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("<stdin>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Open a file as a UTF-8 byte stream, detecting its encoding if asked to
pub fn open_path(path: &Path, encoding: InputEncoding) -> Result<Box<dyn Read>> {
    let encoding = match encoding {
        InputEncoding::Fixed(e) => e,
        InputEncoding::Auto => {
            let info = detect_encoding(path)?;
            log::debug!(
                "{}: detected encoding {} (confidence {:.1})",
                path.display(),
                info.name,
                info.confidence
            );
            info.encoding
        }
    };

    let file = File::open(path).map_err(|source| GrepError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    if let Ok(meta) = file.metadata() {
        log::info!("read data from file {} ({})", path.display(), ByteSize(meta.len()));
    }

    Ok(Box::new(transcoding_reader(file, encoding)))
}
