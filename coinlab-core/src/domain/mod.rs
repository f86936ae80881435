//! Domain types: assets, observation rows and their (slug, timestamp) key.

pub mod asset;
pub mod observation;

pub use asset::Asset;
pub use observation::{ObservationRow, RowKey};
