//! CSV import of raw observations and asset listings.
//!
//! OHLCV files need the header
//! `slug,timestamp,open,high,low,close,volume,market_cap`; listings files
//! need `id,slug,name,symbol,rank` (rank may be empty). Timestamps may be
//! dates (`2024-01-31`) or date-times (`2024-01-31T00:00:00`,
//! `2024-01-31 00:00:00`). Empty numeric fields import as null.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use coinlab_core::domain::{Asset, ObservationRow};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("{path} line {line}: unrecognized timestamp '{value}'")]
    Timestamp {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("{0}: no data rows")]
    Empty(PathBuf),
}

#[derive(Debug, Deserialize)]
struct ObservationRecord {
    slug: String,
    timestamp: String,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
    market_cap: Option<f64>,
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn read_observations_csv(path: &Path) -> Result<Vec<ObservationRow>, ImportError> {
    let csv_err = |source| ImportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let mut rows = Vec::new();
    for result in reader.deserialize::<ObservationRecord>() {
        let record = result.map_err(csv_err)?;
        let timestamp =
            parse_timestamp(&record.timestamp).ok_or_else(|| ImportError::Timestamp {
                path: path.to_path_buf(),
                line: rows.len() as u64 + 2,
                value: record.timestamp.clone(),
            })?;
        let nan = |v: Option<f64>| v.unwrap_or(f64::NAN);
        rows.push(ObservationRow {
            slug: record.slug,
            timestamp,
            open: nan(record.open),
            high: nan(record.high),
            low: nan(record.low),
            close: nan(record.close),
            volume: nan(record.volume),
            market_cap: nan(record.market_cap),
        });
    }
    if rows.is_empty() {
        return Err(ImportError::Empty(path.to_path_buf()));
    }
    info!(path = %path.display(), rows = rows.len(), "observations imported");
    Ok(rows)
}

pub fn read_listings_csv(path: &Path) -> Result<Vec<Asset>, ImportError> {
    let csv_err = |source| ImportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let assets = reader
        .deserialize::<Asset>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(csv_err)?;
    if assets.is_empty() {
        return Err(ImportError::Empty(path.to_path_buf()));
    }
    info!(path = %path.display(), assets = assets.len(), "listings imported");
    Ok(assets)
}
