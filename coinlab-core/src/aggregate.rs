//! SignalAggregator: joins per-family signal tables on (slug, timestamp).
//!
//! The join is a full outer join. A row survives the null filter when it
//! belongs to the reference slug or when every signal column is present;
//! surviving gaps are filled with 0 (neutral). Tallies are computed per
//! column over the filled values, so bullish + bearish + neutral always
//! equals the number of signal columns.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::RowKey;
use crate::score::ScoreBucket;
use crate::signals::SignalTable;
use crate::snapshot::{latest_indices, LatestPolicy};

/// What to do when two input tables carry a column with the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateColumnPolicy {
    /// Abort the aggregation.
    #[default]
    FailFast,
    /// The first table (in input order) keeps the column; later copies are
    /// dropped and logged.
    KeepFirst,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    pub reference_slug: String,
    pub duplicate_columns: DuplicateColumnPolicy,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            reference_slug: "bitcoin".to_string(),
            duplicate_columns: DuplicateColumnPolicy::FailFast,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    #[error("no signal tables to aggregate")]
    NoTables,

    #[error("column '{column}' appears in both '{first}' and '{second}'")]
    ColumnCollision {
        column: String,
        first: String,
        second: String,
    },
}

/// A signal table with the name of the table it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSignals {
    pub name: String,
    pub table: SignalTable,
}

impl NamedSignals {
    pub fn new(name: impl Into<String>, table: SignalTable) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }
}

/// A joined, null-filled signal column.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedColumn {
    pub name: String,
    pub bucket: Option<ScoreBucket>,
    pub values: Vec<i8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedSignals {
    keys: Vec<RowKey>,
    columns: Vec<AggregatedColumn>,
    bullish: Vec<u32>,
    bearish: Vec<u32>,
    neutral: Vec<u32>,
}

impl AggregatedSignals {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[RowKey] {
        &self.keys
    }

    pub fn columns(&self) -> &[AggregatedColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&AggregatedColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn bullish(&self) -> &[u32] {
        &self.bullish
    }

    pub fn bearish(&self) -> &[u32] {
        &self.bearish
    }

    pub fn neutral(&self) -> &[u32] {
        &self.neutral
    }

    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let pick = |v: &[u32]| -> Vec<u32> { indices.iter().map(|&i| v[i]).collect() };
        Self {
            keys: indices.iter().map(|&i| self.keys[i].clone()).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| AggregatedColumn {
                    name: c.name.clone(),
                    bucket: c.bucket,
                    values: indices.iter().map(|&i| c.values[i]).collect(),
                })
                .collect(),
            bullish: pick(&self.bullish),
            bearish: pick(&self.bearish),
            neutral: pick(&self.neutral),
        }
    }

    pub fn select_latest(&self, policy: LatestPolicy) -> Self {
        self.select_rows(&latest_indices(&self.keys, policy))
    }
}

/// Outer-join `tables`, filter, fill and tally.
pub fn aggregate(
    tables: &[NamedSignals],
    options: &AggregateOptions,
) -> Result<AggregatedSignals, AggregateError> {
    if tables.is_empty() {
        return Err(AggregateError::NoTables);
    }

    // (table index, column index) of every column that makes it into the output.
    let mut owners: HashMap<&str, &str> = HashMap::new();
    let mut selected: Vec<(usize, usize)> = Vec::new();
    for (t, named) in tables.iter().enumerate() {
        for (c, column) in named.table.columns().iter().enumerate() {
            if let Some(&first) = owners.get(column.name.as_str()) {
                match options.duplicate_columns {
                    DuplicateColumnPolicy::FailFast => {
                        return Err(AggregateError::ColumnCollision {
                            column: column.name.clone(),
                            first: first.to_string(),
                            second: named.name.clone(),
                        });
                    }
                    DuplicateColumnPolicy::KeepFirst => {
                        warn!(
                            column = %column.name,
                            kept = first,
                            dropped = %named.name,
                            "duplicate signal column dropped"
                        );
                        continue;
                    }
                }
            }
            owners.insert(column.name.as_str(), named.name.as_str());
            selected.push((t, c));
        }
    }

    // Union of keys, in (slug, timestamp) order, with each table's row index.
    let mut rows: BTreeMap<&RowKey, Vec<Option<usize>>> = BTreeMap::new();
    for (t, named) in tables.iter().enumerate() {
        for (i, key) in named.table.keys().iter().enumerate() {
            rows.entry(key).or_insert_with(|| vec![None; tables.len()])[t] = Some(i);
        }
    }

    let joined = rows.len();
    let mut keys = Vec::with_capacity(joined);
    let mut values: Vec<Vec<i8>> = vec![Vec::with_capacity(joined); selected.len()];
    let mut row_values: Vec<Option<i8>> = Vec::with_capacity(selected.len());
    for (key, positions) in rows {
        row_values.clear();
        row_values.extend(selected.iter().map(|&(t, c)| {
            positions[t].and_then(|i| tables[t].table.columns()[c].values[i])
        }));
        let complete = row_values.iter().all(Option::is_some);
        if !complete && key.slug != options.reference_slug {
            continue;
        }
        keys.push(key.clone());
        for (out, v) in values.iter_mut().zip(&row_values) {
            out.push(v.unwrap_or(0));
        }
    }

    let columns: Vec<AggregatedColumn> = selected
        .iter()
        .zip(values)
        .map(|(&(t, c), values)| {
            let source = &tables[t].table.columns()[c];
            AggregatedColumn {
                name: source.name.clone(),
                bucket: source.bucket,
                values,
            }
        })
        .collect();

    let (bullish, bearish, neutral) = tally(&columns, keys.len());
    info!(
        tables = tables.len(),
        columns = columns.len(),
        joined,
        kept = keys.len(),
        "signals aggregated"
    );

    Ok(AggregatedSignals {
        keys,
        columns,
        bullish,
        bearish,
        neutral,
    })
}

/// Column-wise bullish/bearish/neutral counts per row.
fn tally(columns: &[AggregatedColumn], rows: usize) -> (Vec<u32>, Vec<u32>, Vec<u32>) {
    let mut bullish = vec![0u32; rows];
    let mut bearish = vec![0u32; rows];
    for column in columns {
        for (i, &v) in column.values.iter().enumerate() {
            bullish[i] += u32::from(v > 0);
            bearish[i] += u32::from(v < 0);
        }
    }
    let total = columns.len() as u32;
    let neutral = bullish
        .iter()
        .zip(&bearish)
        .map(|(b, s)| total - b - s)
        .collect();
    (bullish, bearish, neutral)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::SignalColumn;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn table(keys: &[(&str, u32)], columns: &[(&str, &[Option<i8>])]) -> SignalTable {
        let keys = keys.iter().map(|&(s, d)| RowKey::new(s, ts(d))).collect();
        columns
            .iter()
            .fold(SignalTable::new(keys), |t, (name, values)| {
                t.with_column(SignalColumn {
                    name: name.to_string(),
                    bucket: Some(ScoreBucket::Momentum),
                    values: values.to_vec(),
                })
                .unwrap()
            })
    }

    fn options(reference: &str) -> AggregateOptions {
        AggregateOptions {
            reference_slug: reference.to_string(),
            ..AggregateOptions::default()
        }
    }

    #[test]
    fn outer_join_keeps_reference_rows_and_fills_zero() {
        let a = table(&[("x", 1), ("x", 2)], &[("a_sig", &[Some(1), Some(-1)])]);
        let b = table(&[("x", 1)], &[("b_sig", &[Some(1)])]);
        let agg = aggregate(
            &[NamedSignals::new("a", a), NamedSignals::new("b", b)],
            &options("x"),
        )
        .unwrap();
        assert_eq!(agg.len(), 2);
        assert_eq!(agg.column("a_sig").unwrap().values, vec![1, -1]);
        assert_eq!(agg.column("b_sig").unwrap().values, vec![1, 0]);
        assert_eq!(agg.bullish(), &[2, 0]);
        assert_eq!(agg.bearish(), &[0, 1]);
        assert_eq!(agg.neutral(), &[0, 1]);
    }

    #[test]
    fn incomplete_rows_of_other_slugs_are_dropped() {
        let a = table(
            &[("bitcoin", 1), ("ether", 1), ("ether", 2)],
            &[("a_sig", &[Some(1), Some(1), None])],
        );
        let b = table(&[("ether", 1)], &[("b_sig", &[Some(0)])]);
        let agg = aggregate(
            &[NamedSignals::new("a", a), NamedSignals::new("b", b)],
            &options("bitcoin"),
        )
        .unwrap();
        let slugs: Vec<(&str, NaiveDateTime)> =
            agg.keys().iter().map(|k| (k.slug.as_str(), k.timestamp)).collect();
        assert_eq!(slugs, vec![("bitcoin", ts(1)), ("ether", ts(1))]);
    }

    #[test]
    fn tallies_always_sum_to_column_count() {
        let a = table(
            &[("x", 1), ("x", 2), ("x", 3)],
            &[
                ("s1", &[Some(1), None, Some(-1)]),
                ("s2", &[Some(0), Some(-1), Some(-1)]),
                ("s3", &[None, None, Some(1)]),
            ],
        );
        let agg = aggregate(&[NamedSignals::new("a", a)], &options("x")).unwrap();
        for i in 0..agg.len() {
            assert_eq!(agg.bullish()[i] + agg.bearish()[i] + agg.neutral()[i], 3);
        }
    }

    #[test]
    fn duplicate_columns_fail_fast_by_default() {
        let a = table(&[("x", 1)], &[("dup", &[Some(1)])]);
        let b = table(&[("x", 1)], &[("dup", &[Some(-1)])]);
        let err = aggregate(
            &[NamedSignals::new("a", a), NamedSignals::new("b", b)],
            &options("x"),
        )
        .unwrap_err();
        assert_eq!(
            err,
            AggregateError::ColumnCollision {
                column: "dup".into(),
                first: "a".into(),
                second: "b".into(),
            }
        );
    }

    #[test]
    fn keep_first_drops_later_duplicates() {
        let a = table(&[("x", 1)], &[("dup", &[Some(1)])]);
        let b = table(&[("x", 1)], &[("dup", &[Some(-1)]), ("b_sig", &[Some(0)])]);
        let opts = AggregateOptions {
            duplicate_columns: DuplicateColumnPolicy::KeepFirst,
            ..options("x")
        };
        let agg = aggregate(
            &[NamedSignals::new("a", a), NamedSignals::new("b", b)],
            &opts,
        )
        .unwrap();
        assert_eq!(agg.columns().len(), 2);
        assert_eq!(agg.column("dup").unwrap().values, vec![1]);
    }

    #[test]
    fn no_tables_is_an_error() {
        assert_eq!(
            aggregate(&[], &AggregateOptions::default()).unwrap_err(),
            AggregateError::NoTables
        );
    }
}
