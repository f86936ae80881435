//! ObservationRow: one OHLCV + market-cap sample for a slug at a timestamp.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Composite key shared by every table in the pipeline.
///
/// Ordering is (slug, timestamp) ascending, which is the partition order all
/// windowed computations rely on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowKey {
    pub slug: String,
    pub timestamp: NaiveDateTime,
}

impl RowKey {
    pub fn new(slug: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            slug: slug.into(),
            timestamp,
        }
    }
}

/// Raw market observation as fetched from the store.
///
/// Missing numeric fields are carried as `f64::NAN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRow {
    pub slug: String,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub market_cap: f64,
}

impl ObservationRow {
    pub fn key(&self) -> RowKey {
        RowKey::new(self.slug.clone(), self.timestamp)
    }
}
