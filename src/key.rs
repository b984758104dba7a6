//! Composite key extraction
//!
//! A key is built from one or more 1-based columns of a row. Each field is
//! trimmed and the pieces are joined with [`KEY_SEPARATOR`].

use crate::error::{GrepError, Result};
use csv::StringRecord;
use std::fmt;
use std::str::FromStr;

/// Joins the fields of a composite key
pub const KEY_SEPARATOR: &str = "_";

/// Ordered, non-empty list of 1-based column indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumns(Vec<usize>);

impl KeyColumns {
    pub fn new(columns: Vec<usize>) -> Result<Self> {
        let spec = || {
            columns
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };

        if columns.is_empty() {
            return Err(GrepError::InvalidKeySpec {
                spec: spec(),
                reason: "no column given".to_string(),
            });
        }
        if columns.contains(&0) {
            return Err(GrepError::InvalidKeySpec {
                spec: spec(),
                reason: "column numbers start at 1".to_string(),
            });
        }

        Ok(Self(columns))
    }

    pub fn columns(&self) -> &[usize] {
        &self.0
    }

    /// Build the composite key of a row
    ///
    /// Fails with [`GrepError::KeyBeyondColumns`] on the first column that
    /// the row does not have.
    pub fn extract(&self, row: &StringRecord) -> Result<String> {
        let ncolumn = row.len();
        let mut key = String::new();

        for (i, &column) in self.0.iter().enumerate() {
            let field = row.get(column - 1).ok_or(GrepError::KeyBeyondColumns {
                key: column,
                columns: ncolumn,
            })?;

            if i > 0 {
                key.push_str(KEY_SEPARATOR);
            }
            key.push_str(field.trim());
        }

        Ok(key)
    }
}

impl Default for KeyColumns {
    fn default() -> Self {
        Self(vec![1])
    }
}

impl FromStr for KeyColumns {
    type Err = GrepError;

    /// Parse "1" or "1,3,4"
    fn from_str(spec: &str) -> Result<Self> {
        let columns = spec
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<usize>().map_err(|_| GrepError::InvalidKeySpec {
                    spec: spec.to_string(),
                    reason: format!("'{}' is not a column number", part),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(columns).map_err(|e| match e {
            GrepError::InvalidKeySpec { reason, .. } => GrepError::InvalidKeySpec {
                spec: spec.to_string(),
                reason,
            },
            other => other,
        })
    }
}

impl fmt::Display for KeyColumns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, column) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", column)?;
        }
        Ok(())
    }
}
