//! TimeSeriesFrame: the per-slug, per-timestamp table every stage consumes.
//!
//! Rows are held sorted by (slug, timestamp) with unique keys, so each slug
//! occupies one contiguous partition. Numeric columns are `f64` with
//! `f64::NAN` as the in-memory null. Stages take the frame by value and
//! return a new frame with added columns; nothing mutates a frame in place.

use std::ops::Range;

use thiserror::Error;
use tracing::warn;

use crate::domain::{ObservationRow, RowKey};
use crate::snapshot::{latest_indices, LatestPolicy};

pub const OPEN: &str = "open";
pub const HIGH: &str = "high";
pub const LOW: &str = "low";
pub const CLOSE: &str = "close";
pub const VOLUME: &str = "volume";
pub const MARKET_CAP: &str = "market_cap";

/// Raw observation columns, in table order.
pub const RAW_COLUMNS: [&str; 6] = [OPEN, HIGH, LOW, CLOSE, VOLUME, MARKET_CAP];

#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("no observation rows to build a frame from")]
    EmptyInput,

    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("column '{0}' has no present values")]
    AllNullColumn(String),

    #[error("column '{column}' has {actual} values, frame has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("row keys are not strictly ascending by (slug, timestamp) at row {0}")]
    UnsortedKeys(usize),
}

/// One slug's contiguous row range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub slug: String,
    pub range: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
struct FrameColumn {
    name: String,
    values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesFrame {
    keys: Vec<RowKey>,
    partitions: Vec<Partition>,
    columns: Vec<FrameColumn>,
}

impl TimeSeriesFrame {
    /// Build a frame from fetched rows.
    ///
    /// Rows are sorted by (slug, timestamp). When a key repeats, the last row
    /// in input order wins and the others are dropped (and logged).
    pub fn from_observations(mut rows: Vec<ObservationRow>) -> Result<Self, FrameError> {
        if rows.is_empty() {
            return Err(FrameError::EmptyInput);
        }

        // Stable sort keeps input order among equal keys.
        rows.sort_by(|a, b| (&a.slug, a.timestamp).cmp(&(&b.slug, b.timestamp)));

        let mut deduped: Vec<ObservationRow> = Vec::with_capacity(rows.len());
        let mut dropped = 0usize;
        for row in rows {
            let repeats = deduped
                .last()
                .is_some_and(|last| last.slug == row.slug && last.timestamp == row.timestamp);
            if repeats {
                if let Some(last) = deduped.last_mut() {
                    *last = row;
                }
                dropped += 1;
            } else {
                deduped.push(row);
            }
        }
        if dropped > 0 {
            warn!(dropped, "removed duplicate (slug, timestamp) observations");
        }

        let keys = deduped.iter().map(ObservationRow::key).collect();
        let columns = vec![
            (OPEN.to_string(), deduped.iter().map(|r| r.open).collect()),
            (HIGH.to_string(), deduped.iter().map(|r| r.high).collect()),
            (LOW.to_string(), deduped.iter().map(|r| r.low).collect()),
            (CLOSE.to_string(), deduped.iter().map(|r| r.close).collect()),
            (VOLUME.to_string(), deduped.iter().map(|r| r.volume).collect()),
            (
                MARKET_CAP.to_string(),
                deduped.iter().map(|r| r.market_cap).collect(),
            ),
        ];

        Self::from_columns(keys, columns)
    }

    /// Build a frame from already-sorted keys and named columns.
    pub fn from_columns(
        keys: Vec<RowKey>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, FrameError> {
        if keys.is_empty() {
            return Err(FrameError::EmptyInput);
        }
        if let Some(i) = keys.windows(2).position(|w| w[0] >= w[1]) {
            return Err(FrameError::UnsortedKeys(i + 1));
        }

        let partitions = build_partitions(&keys);
        let mut frame = Self {
            keys,
            partitions,
            columns: Vec::new(),
        };
        for (name, values) in columns {
            frame = frame.with_column(name, values)?;
        }
        Ok(frame)
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

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Like [`column`](Self::column) but reports a missing column as an error.
    pub fn require(&self, name: &str) -> Result<&[f64], FrameError> {
        self.column(name)
            .ok_or_else(|| FrameError::MissingColumn(name.to_string()))
    }

    /// Fails if `name` is absent or has no present value at all.
    pub fn require_present(&self, name: &str) -> Result<&[f64], FrameError> {
        let values = self.require(name)?;
        if values.iter().all(|v| v.is_nan()) {
            return Err(FrameError::AllNullColumn(name.to_string()));
        }
        Ok(values)
    }

    /// Return a frame extended with one more column.
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<Self, FrameError> {
        let name = name.into();
        if values.len() != self.keys.len() {
            return Err(FrameError::LengthMismatch {
                column: name,
                expected: self.keys.len(),
                actual: values.len(),
            });
        }
        if self.has_column(&name) {
            return Err(FrameError::DuplicateColumn(name));
        }
        self.columns.push(FrameColumn { name, values });
        Ok(self)
    }

    /// Replace every non-finite value (±inf, NaN) with null.
    ///
    /// Returns the frame and the number of infinities that were nulled.
    pub fn normalize_degenerate(mut self) -> (Self, usize) {
        let mut replaced = 0usize;
        for column in &mut self.columns {
            for v in column.values.iter_mut().filter(|v| v.is_infinite()) {
                *v = f64::NAN;
                replaced += 1;
            }
        }
        (self, replaced)
    }

    /// New frame holding only the rows at `indices` (ascending).
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let keys: Vec<RowKey> = indices.iter().map(|&i| self.keys[i].clone()).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| FrameColumn {
                name: c.name.clone(),
                values: indices.iter().map(|&i| c.values[i]).collect(),
            })
            .collect();
        Self {
            partitions: build_partitions(&keys),
            keys,
            columns,
        }
    }

    /// Latest-snapshot view of the frame under `policy`.
    pub fn select_latest(&self, policy: LatestPolicy) -> Self {
        self.select_rows(&latest_indices(&self.keys, policy))
    }
}

fn build_partitions(keys: &[RowKey]) -> Vec<Partition> {
    let mut partitions: Vec<Partition> = Vec::new();
    for (i, key) in keys.iter().enumerate() {
        let continues = partitions.last().is_some_and(|p| p.slug == key.slug);
        if continues {
            if let Some(p) = partitions.last_mut() {
                p.range.end = i + 1;
            }
        } else {
            partitions.push(Partition {
                slug: key.slug.clone(),
                range: i..i + 1,
            });
        }
    }
    partitions
}

/// Test fixture: one row per close for each slug, daily from 2024-01-01,
/// with high/low one unit around the close and constant volume.
#[cfg(test)]
pub fn make_frame(series: &[(&str, &[f64])]) -> TimeSeriesFrame {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let rows = series
        .iter()
        .flat_map(|(slug, closes)| {
            closes.iter().enumerate().map(move |(i, &close)| ObservationRow {
                slug: slug.to_string(),
                timestamp: base + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
                market_cap: close * 1_000_000.0,
            })
        })
        .collect();
    TimeSeriesFrame::from_observations(rows).unwrap()
}
