//! Conversions between core pipeline values and [`TableData`].
//!
//! This is where the in-memory null (`f64::NAN`) meets the storage null:
//! every non-finite float becomes an explicit null on the way out, and
//! nulls read back as `NAN`.

use coinlab_core::domain::{Asset, ObservationRow, RowKey};
use coinlab_core::frame::{TimeSeriesFrame, CLOSE, HIGH, LOW, MARKET_CAP, OPEN, VOLUME};
use coinlab_core::signals::{SignalColumn, SignalError, SignalTable};
use coinlab_core::{AggregatedSignals, ScoreTable};
use thiserror::Error;

use crate::table::{ColumnData, TableData, TableError, SLUG, TIMESTAMP};

pub const BULLISH: &str = "bullish";
pub const BEARISH: &str = "bearish";
pub const NEUTRAL: &str = "neutral";

#[derive(Debug, Error, PartialEq)]
pub enum ConvertError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error("column '{column}' row {row}: {value} is not a signal value")]
    InvalidSignal {
        column: String,
        row: usize,
        value: i64,
    },

    #[error("column '{column}' row {row}: {reason}")]
    InvalidValue {
        column: String,
        row: usize,
        reason: String,
    },
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

fn key_columns(keys: &[RowKey]) -> Result<TableData, TableError> {
    TableData::new()
        .with_column(
            SLUG,
            ColumnData::Str(keys.iter().map(|k| k.slug.clone()).collect()),
        )?
        .with_column(
            TIMESTAMP,
            ColumnData::Timestamp(keys.iter().map(|k| k.timestamp).collect()),
        )
}

/// Feature table: identifiers, then every frame column in frame order.
pub fn frame_to_table(frame: &TimeSeriesFrame) -> Result<TableData, ConvertError> {
    let mut table = key_columns(frame.keys())?;
    for name in frame.column_names() {
        let values = frame.column(name).unwrap_or_default();
        table = table.with_column(
            name,
            ColumnData::Float(values.iter().map(|&v| finite(v)).collect()),
        )?;
    }
    Ok(table)
}

pub fn observations_to_table(rows: &[ObservationRow]) -> Result<TableData, ConvertError> {
    let keys: Vec<RowKey> = rows.iter().map(ObservationRow::key).collect();
    let field = |f: fn(&ObservationRow) -> f64| {
        ColumnData::Float(rows.iter().map(|r| finite(f(r))).collect())
    };
    Ok(key_columns(&keys)?
        .with_column(OPEN, field(|r| r.open))?
        .with_column(HIGH, field(|r| r.high))?
        .with_column(LOW, field(|r| r.low))?
        .with_column(CLOSE, field(|r| r.close))?
        .with_column(VOLUME, field(|r| r.volume))?
        .with_column(MARKET_CAP, field(|r| r.market_cap))?)
}

/// Raw observation rows. Extra columns are ignored; null fields read as NaN.
pub fn observations_from_table(table: &TableData) -> Result<Vec<ObservationRow>, ConvertError> {
    let slugs = table.strings(SLUG)?;
    let timestamps = table.timestamps(TIMESTAMP)?;
    let open = table.floats(OPEN)?;
    let high = table.floats(HIGH)?;
    let low = table.floats(LOW)?;
    let close = table.floats(CLOSE)?;
    let volume = table.floats(VOLUME)?;
    let market_cap = table.floats(MARKET_CAP)?;

    let nan = |v: Option<f64>| v.unwrap_or(f64::NAN);
    Ok((0..table.height())
        .map(|i| ObservationRow {
            slug: slugs[i].clone(),
            timestamp: timestamps[i],
            open: nan(open[i]),
            high: nan(high[i]),
            low: nan(low[i]),
            close: nan(close[i]),
            volume: nan(volume[i]),
            market_cap: nan(market_cap[i]),
        })
        .collect())
}

pub fn assets_to_table(assets: &[Asset]) -> Result<TableData, ConvertError> {
    Ok(TableData::new()
        .with_column("id", ColumnData::Int(assets.iter().map(|a| Some(a.id)).collect()))?
        .with_column(SLUG, ColumnData::Str(assets.iter().map(|a| a.slug.clone()).collect()))?
        .with_column("name", ColumnData::Str(assets.iter().map(|a| a.name.clone()).collect()))?
        .with_column(
            "symbol",
            ColumnData::Str(assets.iter().map(|a| a.symbol.clone()).collect()),
        )?
        .with_column(
            "rank",
            ColumnData::Int(assets.iter().map(|a| a.rank.map(i64::from)).collect()),
        )?)
}

pub fn assets_from_table(table: &TableData) -> Result<Vec<Asset>, ConvertError> {
    let ids = table.ints("id")?;
    let slugs = table.strings(SLUG)?;
    let names = table.strings("name")?;
    let symbols = table.strings("symbol")?;
    let ranks = table.ints("rank")?;

    (0..table.height())
        .map(|i| {
            let id = ids[i].ok_or_else(|| ConvertError::InvalidValue {
                column: "id".into(),
                row: i,
                reason: "null asset id".into(),
            })?;
            let rank = ranks[i]
                .map(u32::try_from)
                .transpose()
                .map_err(|_| ConvertError::InvalidValue {
                    column: "rank".into(),
                    row: i,
                    reason: format!("rank {:?} out of range", ranks[i]),
                })?;
            Ok(Asset {
                id,
                slug: slugs[i].clone(),
                name: names[i].clone(),
                symbol: symbols[i].clone(),
                rank,
            })
        })
        .collect()
}

pub fn signals_to_table(signals: &SignalTable) -> Result<TableData, ConvertError> {
    let mut table = key_columns(signals.keys())?;
    for column in signals.columns() {
        table = table.with_column(
            column.name.as_str(),
            ColumnData::Int(column.values.iter().map(|v| v.map(i64::from)).collect()),
        )?;
    }
    Ok(table)
}

/// Every non-key column is a signal column. Buckets are left unset; tag the
/// result through a `SignalCatalog`.
pub fn signals_from_table(table: &TableData) -> Result<SignalTable, ConvertError> {
    let keys = table.row_keys()?;
    let mut signals = SignalTable::new(keys);
    for name in table.column_names() {
        if name == SLUG || name == TIMESTAMP {
            continue;
        }
        let values = table
            .ints(name)?
            .iter()
            .enumerate()
            .map(|(row, v)| match *v {
                None => Ok(None),
                Some(x @ -1..=1) => Ok(Some(x as i8)),
                Some(x) => Err(ConvertError::InvalidSignal {
                    column: name.to_string(),
                    row,
                    value: x,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        signals = signals.with_column(SignalColumn {
            name: name.to_string(),
            bucket: None,
            values,
        })?;
    }
    Ok(signals)
}

/// All-signals table: identifiers, every joined signal column, then tallies.
pub fn aggregated_to_table(agg: &AggregatedSignals) -> Result<TableData, ConvertError> {
    let mut table = key_columns(agg.keys())?;
    for column in agg.columns() {
        table = table.with_column(
            column.name.as_str(),
            ColumnData::Int(column.values.iter().map(|&v| Some(i64::from(v))).collect()),
        )?;
    }
    let tally = |v: &[u32]| ColumnData::Int(v.iter().map(|&n| Some(i64::from(n))).collect());
    Ok(table
        .with_column(BULLISH, tally(agg.bullish()))?
        .with_column(BEARISH, tally(agg.bearish()))?
        .with_column(NEUTRAL, tally(agg.neutral()))?)
}

pub fn scores_to_table(scores: &ScoreTable) -> Result<TableData, ConvertError> {
    let mut table = key_columns(scores.keys())?;
    for bucket in scores.buckets() {
        table = table.with_column(
            bucket.bucket.score_column(),
            ColumnData::Float(bucket.values.clone()),
        )?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ts;

    fn rows() -> Vec<ObservationRow> {
        (1..=3)
            .map(|d| ObservationRow {
                slug: "bitcoin".into(),
                timestamp: ts(d),
                open: 1.0,
                high: 2.0,
                low: 0.5,
                close: d as f64,
                volume: 10.0,
                market_cap: 100.0,
            })
            .collect()
    }

    #[test]
    fn frame_columns_become_nullable_floats() {
        let frame = TimeSeriesFrame::from_observations(rows())
            .unwrap()
            .with_column("m_x", vec![f64::NAN, f64::INFINITY, 2.0])
            .unwrap();
        let table = frame_to_table(&frame).unwrap();
        assert_eq!(table.column_names()[..3], [SLUG, TIMESTAMP, OPEN]);
        assert_eq!(table.floats("m_x").unwrap(), &[None, None, Some(2.0)]);
    }

    #[test]
    fn observations_read_back() {
        let table = observations_to_table(&rows()).unwrap();
        assert_eq!(observations_from_table(&table).unwrap(), rows());
    }

    #[test]
    fn signals_read_back_untagged() {
        let keys = rows().iter().map(ObservationRow::key).collect();
        let signals = SignalTable::new(keys)
            .with_column(SignalColumn {
                name: "m_mom_roc_sig".into(),
                bucket: Some(coinlab_core::ScoreBucket::Momentum),
                values: vec![None, Some(1), Some(-1)],
            })
            .unwrap();
        let back = signals_from_table(&signals_to_table(&signals).unwrap()).unwrap();
        let column = back.column("m_mom_roc_sig").unwrap();
        assert_eq!(column.values, vec![None, Some(1), Some(-1)]);
        assert_eq!(column.bucket, None);
    }

    #[test]
    fn out_of_range_signal_is_rejected() {
        let table = observations_to_table(&rows()[..1]).unwrap();
        let table = TableData::new()
            .with_column(SLUG, table.column(SLUG).unwrap().clone())
            .unwrap()
            .with_column(TIMESTAMP, table.column(TIMESTAMP).unwrap().clone())
            .unwrap()
            .with_column("bad_sig", ColumnData::Int(vec![Some(2)]))
            .unwrap();
        assert_eq!(
            signals_from_table(&table).unwrap_err(),
            ConvertError::InvalidSignal {
                column: "bad_sig".into(),
                row: 0,
                value: 2,
            }
        );
    }

    #[test]
    fn assets_read_back() {
        let assets = vec![Asset {
            id: 1,
            slug: "bitcoin".into(),
            name: "Bitcoin".into(),
            symbol: "BTC".into(),
            rank: Some(1),
        }];
        let table = assets_to_table(&assets).unwrap();
        assert_eq!(assets_from_table(&table).unwrap(), assets);
    }
}
