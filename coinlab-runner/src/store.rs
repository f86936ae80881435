//! PersistenceGateway: named tables in a Parquet directory.
//!
//! Layout: `{root}/{table}.parquet` plus a `{table}.meta.json` sidecar.
//!
//! - `replace` writes to `.tmp` and renames into place, so readers see
//!   either the old table or the new one
//! - `append` reads the existing table, stacks the new rows under it
//!   (schemas must match) and writes the result the same way
//! - the sidecar records row count, schema and a content hash of the table

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::table::{ColumnData, TableData, TableError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Full overwrite; rerunning on identical input is idempotent.
    #[default]
    Replace,
    /// Accrete rows onto the existing table. No dedup at write time.
    Append,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parquet error on {path}: {message}")]
    Parquet { path: PathBuf, message: String },

    #[error("metadata error on {path}: {message}")]
    Meta { path: PathBuf, message: String },

    #[error("invalid table name '{0}'")]
    InvalidName(String),

    #[error("table '{table}': {source}")]
    Table { table: String, source: TableError },
}

/// Sidecar written next to every table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    pub table: String,
    pub rows: usize,
    pub schema: Vec<String>,
    pub content_hash: String,
    pub mode: WriteMode,
    pub written_at: NaiveDateTime,
}

pub trait TableStore {
    /// Read a whole table, or `None` if it does not exist.
    fn read(&self, table: &str) -> Result<Option<TableData>, StoreError>;

    /// Write `data` under `table` and return the resulting metadata.
    fn write(&self, table: &str, data: &TableData, mode: WriteMode)
        -> Result<TableMeta, StoreError>;

    /// Metadata of the last write, if any.
    fn meta(&self, table: &str) -> Result<Option<TableMeta>, StoreError>;
}

/// Parquet-backed [`TableStore`].
#[derive(Debug, Clone)]
pub struct ParquetStore {
    root: PathBuf,
}

impl ParquetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn table_path(&self, table: &str) -> Result<PathBuf, StoreError> {
        validate_name(table)?;
        Ok(self.root.join(format!("{table}.parquet")))
    }

    fn meta_path(&self, table: &str) -> Result<PathBuf, StoreError> {
        validate_name(table)?;
        Ok(self.root.join(format!("{table}.meta.json")))
    }
}

impl TableStore for ParquetStore {
    fn read(&self, table: &str) -> Result<Option<TableData>, StoreError> {
        let path = self.table_path(table)?;
        if !path.exists() {
            return Ok(None);
        }
        let data = read_parquet(&path)?;
        debug!(table, rows = data.height(), "table read");
        Ok(Some(data))
    }

    fn write(
        &self,
        table: &str,
        data: &TableData,
        mode: WriteMode,
    ) -> Result<TableMeta, StoreError> {
        let path = self.table_path(table)?;
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Io {
            path: self.root.clone(),
            source,
        })?;

        let table_err = |source| StoreError::Table {
            table: table.to_string(),
            source,
        };
        let merged = match mode {
            WriteMode::Replace => data.clone(),
            WriteMode::Append => match self.read(table)? {
                Some(existing) => existing.vstack(data.clone()).map_err(table_err)?,
                None => data.clone(),
            },
        };

        let tmp_path = path.with_extension("parquet.tmp");
        write_parquet(&merged, &tmp_path)?;
        fs::rename(&tmp_path, &path).map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::Io {
                path: path.clone(),
                source,
            }
        })?;

        let meta = TableMeta {
            table: table.to_string(),
            rows: merged.height(),
            schema: merged.schema(),
            content_hash: merged.content_hash().map_err(table_err)?,
            mode,
            written_at: chrono::Utc::now().naive_utc(),
        };
        write_meta(&self.meta_path(table)?, &meta)?;

        info!(
            table,
            mode = ?mode,
            written = data.height(),
            rows = meta.rows,
            "table written"
        );
        Ok(meta)
    }

    fn meta(&self, table: &str) -> Result<Option<TableMeta>, StoreError> {
        let path = self.meta_path(table)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::Meta {
                path,
                message: e.to_string(),
            })
    }
}

/// Table names become file names: keep them to `[A-Za-z0-9_-]`.
fn validate_name(table: &str) -> Result<(), StoreError> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(table.to_string()))
    }
}

fn write_meta(path: &Path, meta: &TableMeta) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(meta).map_err(|e| StoreError::Meta {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    fs::write(path, json).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn to_dataframe(data: &TableData) -> PolarsResult<DataFrame> {
    let columns = data
        .columns()
        .iter()
        .map(|c| {
            let name: PlSmallStr = c.name.as_str().into();
            Ok(match &c.data {
                ColumnData::Str(v) => Column::new(name, v),
                ColumnData::Timestamp(v) => {
                    let millis: Vec<i64> =
                        v.iter().map(|t| t.and_utc().timestamp_millis()).collect();
                    Column::new(name, millis)
                        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                }
                ColumnData::Float(v) => Column::new(name, v),
                ColumnData::Int(v) => Column::new(name, v),
            })
        })
        .collect::<PolarsResult<Vec<Column>>>()?;
    DataFrame::new(columns)
}

fn from_dataframe(df: &DataFrame) -> Result<TableData, String> {
    let mut table = TableData::new();
    for column in df.get_columns() {
        let name = column.name().to_string();
        let polars_err = |e: PolarsError| format!("column '{name}': {e}");
        let data = match column.dtype() {
            DataType::String => ColumnData::Str(
                column
                    .str()
                    .map_err(polars_err)?
                    .into_iter()
                    .map(|v| v.map(str::to_string))
                    .collect::<Option<Vec<String>>>()
                    .ok_or_else(|| format!("column '{name}': null identifier"))?,
            ),
            DataType::Datetime(_, _) => {
                let millis = column.cast(&DataType::Int64).map_err(polars_err)?;
                ColumnData::Timestamp(
                    millis
                        .i64()
                        .map_err(polars_err)?
                        .into_iter()
                        .map(|v| v.and_then(DateTime::from_timestamp_millis))
                        .map(|t| t.map(|t| t.naive_utc()))
                        .collect::<Option<Vec<NaiveDateTime>>>()
                        .ok_or_else(|| format!("column '{name}': null or invalid timestamp"))?,
                )
            }
            DataType::Float64 => {
                ColumnData::Float(column.f64().map_err(polars_err)?.into_iter().collect())
            }
            DataType::Int64 => {
                ColumnData::Int(column.i64().map_err(polars_err)?.into_iter().collect())
            }
            other => return Err(format!("column '{name}': unsupported type {other}")),
        };
        table = table.with_column(name, data).map_err(|e| e.to_string())?;
    }
    Ok(table)
}

fn write_parquet(data: &TableData, path: &Path) -> Result<(), StoreError> {
    let parquet_err = |message: String| StoreError::Parquet {
        path: path.to_path_buf(),
        message,
    };
    let mut df = to_dataframe(data).map_err(|e| parquet_err(format!("dataframe creation: {e}")))?;
    let file = fs::File::create(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| parquet_err(format!("write: {e}")))?;
    Ok(())
}

fn read_parquet(path: &Path) -> Result<TableData, StoreError> {
    let parquet_err = |message: String| StoreError::Parquet {
        path: path.to_path_buf(),
        message,
    };
    let file = fs::File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| parquet_err(format!("read: {e}")))?;
    from_dataframe(&df).map_err(parquet_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ts, SLUG, TIMESTAMP};

    fn sample(days: &[u32]) -> TableData {
        TableData::new()
            .with_column(SLUG, ColumnData::Str(days.iter().map(|_| "bitcoin".to_string()).collect()))
            .unwrap()
            .with_column(TIMESTAMP, ColumnData::Timestamp(days.iter().map(|&d| ts(d)).collect()))
            .unwrap()
            .with_column(
                "close",
                ColumnData::Float(days.iter().map(|&d| (d % 2 == 0).then_some(d as f64)).collect()),
            )
            .unwrap()
            .with_column("sig", ColumnData::Int(days.iter().map(|_| Some(-1)).collect()))
            .unwrap()
    }

    #[test]
    fn missing_table_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetStore::new(dir.path());
        assert!(store.read("nothing").unwrap().is_none());
        assert!(store.meta("nothing").unwrap().is_none());
    }

    #[test]
    fn replace_round_trips_values_and_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetStore::new(dir.path());
        let data = sample(&[1, 2, 3]);
        let meta = store.write("t", &data, WriteMode::Replace).unwrap();
        assert_eq!(meta.rows, 3);
        assert_eq!(store.read("t").unwrap().unwrap(), data);
        assert_eq!(store.meta("t").unwrap().unwrap(), meta);
        assert!(!dir.path().join("t.parquet.tmp").exists());
    }

    #[test]
    fn replace_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetStore::new(dir.path());
        let first = store.write("t", &sample(&[1, 2]), WriteMode::Replace).unwrap();
        let second = store.write("t", &sample(&[1, 2]), WriteMode::Replace).unwrap();
        assert_eq!(first.content_hash, second.content_hash);
        assert_eq!(second.rows, 2);
    }

    #[test]
    fn append_accretes_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetStore::new(dir.path());
        store.write("bt", &sample(&[1]), WriteMode::Append).unwrap();
        let meta = store.write("bt", &sample(&[2, 3]), WriteMode::Append).unwrap();
        assert_eq!(meta.rows, 3);
        let back = store.read("bt").unwrap().unwrap();
        assert_eq!(back.timestamps(TIMESTAMP).unwrap(), &[ts(1), ts(2), ts(3)]);
    }

    #[test]
    fn append_with_other_schema_fails_and_keeps_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetStore::new(dir.path());
        store.write("bt", &sample(&[1]), WriteMode::Append).unwrap();
        let other = TableData::new()
            .with_column(SLUG, ColumnData::Str(vec!["x".into()]))
            .unwrap();
        let err = store.write("bt", &other, WriteMode::Append).unwrap_err();
        assert!(matches!(err, StoreError::Table { .. }));
        assert_eq!(store.read("bt").unwrap().unwrap(), sample(&[1]));
    }

    #[test]
    fn rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = ParquetStore::new(dir.path());
        assert!(matches!(
            store.write("../escape", &sample(&[1]), WriteMode::Replace),
            Err(StoreError::InvalidName(_))
        ));
    }
}
