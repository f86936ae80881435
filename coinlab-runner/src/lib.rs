//! coinlab runner: persistence and orchestration around `coinlab-core`.
//!
//! - [`store`]: named tables in a Parquet directory, replace or append
//! - [`table`]/[`convert`]: typed column bundles at the storage boundary
//! - [`import`]: raw OHLCV and listings from CSV
//! - [`config`]: TOML run configuration with per-table output specs
//! - [`pipeline`]: family runs, the aggregate run, and both together

pub mod config;
pub mod convert;
pub mod import;
pub mod pipeline;
pub mod store;
pub mod table;

pub use config::{ConfigError, OutputSpec, RunConfig, Snapshot};
pub use convert::ConvertError;
pub use import::{read_listings_csv, read_observations_csv, ImportError};
pub use pipeline::{
    ingest, run_aggregate, run_all, run_family, AggregateRunSummary, FamilyRunSummary,
    IngestSummary, RunAllSummary, RunError,
};
pub use store::{ParquetStore, StoreError, TableMeta, TableStore, WriteMode};
pub use table::{ColumnData, TableData, TableError};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn store_and_tables_are_send_sync() {
        assert_send::<ParquetStore>();
        assert_sync::<ParquetStore>();
        assert_send::<TableData>();
        assert_sync::<TableData>();
    }

    #[test]
    fn config_and_errors_are_send() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
        assert_send::<RunError>();
    }
}
