//! Asset reference data from the listings table.

use serde::{Deserialize, Serialize};

/// A listed cryptocurrency.
///
/// Owned by the upstream listings collaborator; read-only here. `rank` is the
/// market-cap rank used to restrict the universe (lower is larger).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub symbol: String,
    pub rank: Option<u32>,
}

impl Asset {
    /// True if the asset carries a rank within `limit` (inclusive).
    pub fn within_rank(&self, limit: u32) -> bool {
        matches!(self.rank, Some(r) if r <= limit)
    }
}
