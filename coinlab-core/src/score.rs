//! ScoreComposer: rolls aggregated signals into per-bucket scores in [-100, 100].
//!
//! score = 100 * (sum of the bucket's signal columns) / (number of columns)
//!
//! Membership comes from the [`ScoreBucket`] tag each signal column carries.
//! A bucket with no member columns scores `None` on every row.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregatedSignals;
use crate::domain::RowKey;
use crate::snapshot::{latest_indices, LatestPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBucket {
    Durability,
    Momentum,
    Valuation,
}

impl ScoreBucket {
    pub const ALL: [ScoreBucket; 3] = [
        ScoreBucket::Durability,
        ScoreBucket::Momentum,
        ScoreBucket::Valuation,
    ];

    /// Output column name in the scores table.
    pub fn score_column(self) -> &'static str {
        match self {
            ScoreBucket::Durability => "Durability_Score",
            ScoreBucket::Momentum => "Momentum_Score",
            ScoreBucket::Valuation => "Valuation_Score",
        }
    }
}

impl fmt::Display for ScoreBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScoreBucket::Durability => "durability",
            ScoreBucket::Momentum => "momentum",
            ScoreBucket::Valuation => "valuation",
        };
        f.write_str(name)
    }
}

/// Scores for one bucket across all rows.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketScores {
    pub bucket: ScoreBucket,
    pub members: usize,
    pub values: Vec<Option<f64>>,
}

/// One score row per aggregated row, in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreTable {
    keys: Vec<RowKey>,
    buckets: Vec<BucketScores>,
}

impl ScoreTable {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[RowKey] {
        &self.keys
    }

    /// Buckets in [`ScoreBucket::ALL`] order.
    pub fn buckets(&self) -> &[BucketScores] {
        &self.buckets
    }

    pub fn scores(&self, bucket: ScoreBucket) -> &[Option<f64>] {
        self.buckets
            .iter()
            .find(|b| b.bucket == bucket)
            .map(|b| b.values.as_slice())
            .unwrap_or(&[])
    }

    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            keys: indices.iter().map(|&i| self.keys[i].clone()).collect(),
            buckets: self
                .buckets
                .iter()
                .map(|b| BucketScores {
                    bucket: b.bucket,
                    members: b.members,
                    values: indices.iter().map(|&i| b.values[i]).collect(),
                })
                .collect(),
        }
    }

    pub fn select_latest(&self, policy: LatestPolicy) -> Self {
        self.select_rows(&latest_indices(&self.keys, policy))
    }
}

pub fn compose_scores(signals: &AggregatedSignals) -> ScoreTable {
    let rows = signals.len();
    let buckets = ScoreBucket::ALL
        .iter()
        .map(|&bucket| {
            let members: Vec<&[i8]> = signals
                .columns()
                .iter()
                .filter(|c| c.bucket == Some(bucket))
                .map(|c| c.values.as_slice())
                .collect();
            if members.is_empty() {
                return BucketScores {
                    bucket,
                    members: 0,
                    values: vec![None; rows],
                };
            }
            let mut sums = vec![0i64; rows];
            for column in &members {
                for (sum, &v) in sums.iter_mut().zip(column.iter()) {
                    *sum += i64::from(v);
                }
            }
            let count = members.len() as f64;
            BucketScores {
                bucket,
                members: members.len(),
                values: sums
                    .into_iter()
                    .map(|s| Some(100.0 * s as f64 / count))
                    .collect(),
            }
        })
        .collect();

    ScoreTable {
        keys: signals.keys().to_vec(),
        buckets,
    }
}
