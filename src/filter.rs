//! Row filtering module
//!
//! Decides keep/drop per row and owns the pattern set, which shrinks in
//! speedup mode as patterns are consumed.

use crate::error::Result;
use crate::key::KeyColumns;
use crate::pattern::PatternSet;
use csv::StringRecord;

/// Filter options independent of the pattern source
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    /// Columns of the input forming the row key
    pub key_columns: KeyColumns,
    /// Remove a pattern after its first hit
    pub speedup: bool,
    /// Keep rows that do not match
    pub invert: bool,
}

/// Keep/drop decision for rows
#[derive(Debug)]
pub struct RowFilter {
    patterns: PatternSet,
    options: FilterOptions,
}

impl RowFilter {
    pub fn new(patterns: PatternSet, options: FilterOptions) -> Self {
        Self { patterns, options }
    }

    /// Check a row; true means it goes to the output
    ///
    /// Empty rows are always dropped. In speedup mode a hit removes the
    /// matching pattern whatever the invert polarity.
    pub fn check(&mut self, row: &StringRecord) -> Result<bool> {
        if row.is_empty() {
            return Ok(false);
        }

        let key = self.options.key_columns.extract(row)?;
        let hit = self.patterns.check(&key, self.options.speedup);

        log::debug!("key: {}; hit: {}; row: {:?}", key, hit, row);

        Ok(hit != self.options.invert)
    }

    /// No row can hit any more
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.options.speedup && self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }
}
