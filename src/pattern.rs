//! Pattern set construction and matching
//!
//! Patterns come from an optional literal and an optional pattern file. The
//! builder collects distinct keys in insertion order; [`PatternSetBuilder::build`]
//! then fixes the matching mode once:
//! - Literal: exact key lookup in a hash set
//! - Regex: every key pre-compiled, searched anywhere in the row key

use crate::encoding::InputEncoding;
use crate::error::{GrepError, Result};
use crate::input::{open_path, CsvFormat, RowReader};
use crate::key::KeyColumns;

use ahash::RandomState;
use csv::StringRecord;
use hashbrown::HashSet;
use regex::Regex;
use std::io::Read;
use std::path::{Path, PathBuf};

/// How pattern keys are compared with row keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Exact equality
    #[default]
    Literal,
    /// Regular expression search anywhere in the key
    Regex,
}

/// A pattern key with its compiled matcher
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    pub fn new(source: String) -> Result<Self> {
        let regex = Regex::new(&source).map_err(|e| GrepError::InvalidRegex {
            pattern: source.clone(),
            source: e,
        })?;
        Ok(Self { source, regex })
    }

    /// The pattern text as it was loaded
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn is_match(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}

/// Set of patterns a row key is tested against
#[derive(Debug, Clone)]
pub enum PatternSet {
    Literal(HashSet<String, RandomState>),
    /// Kept in insertion order; the first match is the one consumed
    Regex(Vec<CompiledPattern>),
}

impl PatternSet {
    pub fn mode(&self) -> MatchMode {
        match self {
            Self::Literal(_) => MatchMode::Literal,
            Self::Regex(_) => MatchMode::Regex,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Literal(keys) => keys.len(),
            Self::Regex(patterns) => patterns.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Test `key` against the set
    ///
    /// Returns true on a hit. With `consume`, the pattern that hit is removed
    /// so it can never hit again.
    #[inline]
    pub fn check(&mut self, key: &str, consume: bool) -> bool {
        match self {
            Self::Literal(keys) => {
                if consume {
                    keys.remove(key)
                } else {
                    keys.contains(key)
                }
            }
            Self::Regex(patterns) => match patterns.iter().position(|p| p.is_match(key)) {
                Some(idx) => {
                    if consume {
                        let consumed = patterns.remove(idx);
                        log::trace!("pattern consumed: {}", consumed.as_str());
                    }
                    true
                }
                None => false,
            },
        }
    }

    /// Whether a pattern with exactly this text is still in the set
    pub fn contains_pattern(&self, pattern: &str) -> bool {
        match self {
            Self::Literal(keys) => keys.contains(pattern),
            Self::Regex(patterns) => patterns.iter().any(|p| p.as_str() == pattern),
        }
    }
}

/// Collects distinct pattern keys before the matching mode is fixed
#[derive(Debug, Default)]
pub struct PatternSetBuilder {
    keys: Vec<String>,
    seen: HashSet<String, RandomState>,
    pattern_file: Option<PathBuf>,
}

impl PatternSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one key; returns false if it was already present
    pub fn add(&mut self, key: String) -> bool {
        if self.seen.contains(key.as_str()) {
            return false;
        }
        self.seen.insert(key.clone());
        self.keys.push(key);
        true
    }

    /// Add the literal command-line pattern; an empty string counts as absent
    pub fn add_literal(&mut self, pattern: &str) -> &mut Self {
        if !pattern.is_empty() {
            self.add(pattern.to_string());
        }
        self
    }

    /// Add one key per non-empty row of `rows`
    ///
    /// Returns the number of rows read. A row lacking a key column aborts
    /// the whole load.
    pub fn add_rows<R: Read>(&mut self, rows: &mut RowReader<R>, key_columns: &KeyColumns) -> Result<u64> {
        let mut record = StringRecord::new();
        let mut count = 0;

        while rows.read_row(&mut record)? {
            if record.is_empty() {
                continue;
            }
            count += 1;
            let key = key_columns.extract(&record)?;
            self.add(key);
        }

        Ok(count)
    }

    /// Load a pattern file; no title row is skipped
    pub fn add_file(
        &mut self,
        path: &Path,
        format: &CsvFormat,
        key_columns: &KeyColumns,
        encoding: InputEncoding,
    ) -> Result<u64> {
        self.pattern_file = Some(path.to_path_buf());

        let mut reader = format.rows(open_path(path, encoding)?);
        let rows = self.add_rows(&mut reader, key_columns)?;
        log::debug!("{}: {} pattern rows", path.display(), rows);

        Ok(rows)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Fix the matching mode; regex keys are all compiled here
    pub fn build(self, mode: MatchMode) -> Result<PatternSet> {
        if self.keys.is_empty() {
            return Err(GrepError::NoPattern {
                pattern_file: self
                    .pattern_file
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "-".to_string()),
            });
        }

        match mode {
            MatchMode::Literal => Ok(PatternSet::Literal(self.seen)),
            MatchMode::Regex => {
                let patterns = self
                    .keys
                    .into_iter()
                    .map(CompiledPattern::new)
                    .collect::<Result<Vec<_>>>()?;
                Ok(PatternSet::Regex(patterns))
            }
        }
    }
}
