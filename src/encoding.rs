//! Encoding detection and transcoding module
//!
//! Input sources are transcoded to UTF-8 before CSV decoding. Files can be
//! sniffed with chardetng; STDIN cannot be rewound, so it is read as UTF-8
//! unless a BOM or an explicit label says otherwise.

use crate::error::{GrepError, Result};
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use encoding_rs_io::{DecodeReaderBytes, DecodeReaderBytesBuilder};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Size of the sample fed to the detector
const SAMPLE_SIZE: usize = 64 * 1024;

/// How the encoding of an input source is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputEncoding {
    /// Sniff files, assume UTF-8 on STDIN
    #[default]
    Auto,
    /// Use the given encoding for every source
    Fixed(&'static Encoding),
}

impl InputEncoding {
    /// Parse `auto` or any WHATWG encoding label ("utf-8", "latin1", "gbk", ...)
    pub fn from_label(label: &str) -> Result<Self> {
        if label.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        Encoding::for_label(label.trim().as_bytes())
            .map(Self::Fixed)
            .ok_or_else(|| GrepError::UnknownEncoding(label.to_string()))
    }
}

/// Result of encoding detection
#[derive(Debug, Clone)]
pub struct EncodingInfo {
    /// Detected encoding name
    pub name: &'static str,
    /// Confidence level (0.0 - 1.0)
    pub confidence: f32,
    /// The encoding_rs Encoding reference
    pub encoding: &'static Encoding,
}

impl Default for EncodingInfo {
    fn default() -> Self {
        Self {
            name: "UTF-8",
            confidence: 1.0,
            encoding: encoding_rs::UTF_8,
        }
    }
}

/// Detect the encoding of a file by sampling its content
pub fn detect_encoding(path: &Path) -> Result<EncodingInfo> {
    let file = File::open(path).map_err(|source| GrepError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut sample = Vec::with_capacity(SAMPLE_SIZE);
    file.take(SAMPLE_SIZE as u64).read_to_end(&mut sample)?;

    if sample.is_empty() {
        return Ok(EncodingInfo::default());
    }

    // BOM wins over any guess
    if let Some(encoding) = detect_bom(&sample) {
        return Ok(EncodingInfo {
            name: encoding.name(),
            confidence: 1.0,
            encoding,
        });
    }

    // Pure ASCII decodes the same under every candidate; keep it UTF-8
    if sample.is_ascii() {
        return Ok(EncodingInfo::default());
    }

    let mut detector = EncodingDetector::new();
    detector.feed(&sample, sample.len() < SAMPLE_SIZE);
    let encoding = detector.guess(None, true);

    // The sample may cut a multi-byte sequence, so only the prefix has to be valid
    let confidence = if encoding == encoding_rs::UTF_8 {
        match std::str::from_utf8(&sample) {
            Ok(_) => 1.0,
            Err(e) if e.error_len().is_none() => 1.0,
            Err(_) => 0.5,
        }
    } else {
        0.8
    };

    Ok(EncodingInfo {
        name: encoding.name(),
        confidence,
        encoding,
    })
}

/// Detect BOM (Byte Order Mark) at the start of content
fn detect_bom(content: &[u8]) -> Option<&'static Encoding> {
    Encoding::for_bom(content).map(|(encoding, _)| encoding)
}

/// Wrap a byte stream in a reader that yields UTF-8
///
/// A BOM overrides `encoding` and is stripped. Malformed sequences are
/// replaced with U+FFFD instead of failing the run.
pub fn transcoding_reader<R: Read>(inner: R, encoding: &'static Encoding) -> DecodeReaderBytes<R, Vec<u8>> {
    DecodeReaderBytesBuilder::new()
        .encoding(Some(encoding))
        .bom_override(true)
        .strip_bom(true)
        .build(inner)
}
