//! SignalEncoder: discretizes indicator columns into {-1, 0, +1} signals.
//!
//! A [`SignalSpec`] names the signal, the indicator column it reads, the
//! [`Rule`] applied per row, and the score bucket it contributes to. The
//! bucket travels with the encoded column so scoring never has to guess
//! membership from column names.

pub mod rule;

pub use rule::{Cmp, Rule};

use thiserror::Error;
use tracing::warn;

use crate::domain::RowKey;
use crate::frame::TimeSeriesFrame;
use crate::score::ScoreBucket;
use crate::snapshot::{latest_indices, LatestPolicy};

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSpec {
    pub name: String,
    pub source: String,
    pub rule: Rule,
    pub bucket: ScoreBucket,
}

impl SignalSpec {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        rule: Rule,
        bucket: ScoreBucket,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            rule,
            bucket,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SignalError {
    #[error("signal '{signal}': missing input column '{column}'")]
    MissingColumn { signal: String, column: String },

    #[error("signal column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("signal column '{column}' has {actual} values, table has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

/// One encoded signal. `bucket` is `None` for columns of unknown origin
/// (e.g. read back from storage and not in the catalog).
#[derive(Debug, Clone, PartialEq)]
pub struct SignalColumn {
    pub name: String,
    pub bucket: Option<ScoreBucket>,
    pub values: Vec<Option<i8>>,
}

/// Signal columns keyed by (slug, timestamp).
#[derive(Debug, Clone, PartialEq)]
pub struct SignalTable {
    keys: Vec<RowKey>,
    columns: Vec<SignalColumn>,
}

impl SignalTable {
    pub fn new(keys: Vec<RowKey>) -> Self {
        Self {
            keys,
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: SignalColumn) -> Result<Self, SignalError> {
        if column.values.len() != self.keys.len() {
            return Err(SignalError::LengthMismatch {
                column: column.name,
                expected: self.keys.len(),
                actual: column.values.len(),
            });
        }
        if self.column(&column.name).is_some() {
            return Err(SignalError::DuplicateColumn(column.name));
        }
        self.columns.push(column);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[RowKey] {
        &self.keys
    }

    pub fn columns(&self) -> &[SignalColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&SignalColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Rebuild every column through `f`, keeping the keys.
    pub fn map_columns<F>(self, f: F) -> Self
    where
        F: FnMut(SignalColumn) -> SignalColumn,
    {
        Self {
            keys: self.keys,
            columns: self.columns.into_iter().map(f).collect(),
        }
    }

    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            keys: indices.iter().map(|&i| self.keys[i].clone()).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| SignalColumn {
                    name: c.name.clone(),
                    bucket: c.bucket,
                    values: indices.iter().map(|&i| c.values[i]).collect(),
                })
                .collect(),
        }
    }

    pub fn select_latest(&self, policy: LatestPolicy) -> Self {
        self.select_rows(&latest_indices(&self.keys, policy))
    }
}

/// Encode one signal over every row of `frame`.
pub fn encode(frame: &TimeSeriesFrame, spec: &SignalSpec) -> Result<SignalColumn, SignalError> {
    let lookup = |column: &str| {
        frame.column(column).ok_or_else(|| SignalError::MissingColumn {
            signal: spec.name.clone(),
            column: column.to_string(),
        })
    };
    let source = lookup(spec.source.as_str())?;
    let refs = spec
        .rule
        .references()
        .into_iter()
        .map(lookup)
        .collect::<Result<Vec<&[f64]>, _>>()?;

    let mut row_refs = vec![0.0; refs.len()];
    let values = source
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            for (slot, column) in row_refs.iter_mut().zip(&refs) {
                *slot = column[i];
            }
            spec.rule.encode(v, &row_refs)
        })
        .collect();

    Ok(SignalColumn {
        name: spec.name.clone(),
        bucket: Some(spec.bucket),
        values,
    })
}

/// Encode every spec against `frame`.
///
/// A spec whose inputs are absent (because the producing indicator was
/// skipped) is logged and left out of the table.
pub fn encode_all(frame: &TimeSeriesFrame, specs: &[SignalSpec]) -> Result<SignalTable, SignalError> {
    let mut table = SignalTable::new(frame.keys().to_vec());
    for spec in specs {
        match encode(frame, spec) {
            Ok(column) => table = table.with_column(column)?,
            Err(err @ SignalError::MissingColumn { .. }) => {
                warn!(signal = %spec.name, error = %err, "signal skipped");
            }
            Err(err) => return Err(err),
        }
    }
    Ok(table)
}
