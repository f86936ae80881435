//! Latest-snapshot selection.
//!
//! Two distinct policies: feature tables publish the rows at the global
//! latest timestamp, per-asset tables publish each slug's own latest row.
//! A slug that stopped updating drops out of the global snapshot but stays
//! in the per-slug one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::RowKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatestPolicy {
    /// Rows whose timestamp equals the maximum timestamp across all slugs.
    Global,
    /// For each slug, the row with that slug's maximum timestamp.
    PerSlug,
}

/// Indices (ascending) of the rows selected by `policy`.
///
/// `keys` need not be sorted. If a slug repeats its latest timestamp (as an
/// append-mode table can), every copy is kept under `Global` and the last
/// copy under `PerSlug`.
pub fn latest_indices(keys: &[RowKey], policy: LatestPolicy) -> Vec<usize> {
    match policy {
        LatestPolicy::Global => {
            let Some(max_ts) = keys.iter().map(|k| k.timestamp).max() else {
                return Vec::new();
            };
            keys.iter()
                .enumerate()
                .filter(|(_, k)| k.timestamp == max_ts)
                .map(|(i, _)| i)
                .collect()
        }
        LatestPolicy::PerSlug => {
            let mut latest: BTreeMap<&str, usize> = BTreeMap::new();
            for (i, key) in keys.iter().enumerate() {
                let slot = latest.entry(key.slug.as_str()).or_insert(i);
                if keys[*slot].timestamp <= key.timestamp {
                    *slot = i;
                }
            }
            let mut indices: Vec<usize> = latest.into_values().collect();
            indices.sort_unstable();
            indices
        }
    }
}
