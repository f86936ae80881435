//! `TableData`: the typed column bundle exchanged with a [`TableStore`](crate::store::TableStore).
//!
//! Tables are column-major. Identifier columns are non-null strings and
//! timestamps; numeric columns carry explicit nulls. A table's canonical CSV
//! rendering is the input to its content hash, so two tables hash equal iff
//! they have the same schema and the same values in the same row order.
//!
//! [`TableStore`]: crate::store::TableStore

use chrono::NaiveDateTime;
use coinlab_core::domain::RowKey;
use coinlab_core::snapshot::{latest_indices, LatestPolicy};
use thiserror::Error;

pub const SLUG: &str = "slug";
pub const TIMESTAMP: &str = "timestamp";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("missing column '{0}'")]
    MissingColumn(String),

    #[error("column '{column}' is {actual}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("column '{column}' has {actual} rows, table has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("schema mismatch: existing [{existing}], incoming [{incoming}]")]
    SchemaMismatch { existing: String, incoming: String },

    #[error("canonical rendering failed: {0}")]
    Render(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Str(Vec<String>),
    Timestamp(Vec<NaiveDateTime>),
    Float(Vec<Option<f64>>),
    Int(Vec<Option<i64>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Str(v) => v.len(),
            ColumnData::Timestamp(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Int(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnData::Str(_) => "string",
            ColumnData::Timestamp(_) => "timestamp",
            ColumnData::Float(_) => "float",
            ColumnData::Int(_) => "int",
        }
    }

    fn select(&self, indices: &[usize]) -> Self {
        match self {
            ColumnData::Str(v) => ColumnData::Str(indices.iter().map(|&i| v[i].clone()).collect()),
            ColumnData::Timestamp(v) => {
                ColumnData::Timestamp(indices.iter().map(|&i| v[i]).collect())
            }
            ColumnData::Float(v) => ColumnData::Float(indices.iter().map(|&i| v[i]).collect()),
            ColumnData::Int(v) => ColumnData::Int(indices.iter().map(|&i| v[i]).collect()),
        }
    }

    fn extend(&mut self, other: ColumnData) {
        match (self, other) {
            (ColumnData::Str(a), ColumnData::Str(b)) => a.extend(b),
            (ColumnData::Timestamp(a), ColumnData::Timestamp(b)) => a.extend(b),
            (ColumnData::Float(a), ColumnData::Float(b)) => a.extend(b),
            (ColumnData::Int(a), ColumnData::Int(b)) => a.extend(b),
            // Callers check schemas before extending.
            _ => {}
        }
    }

    fn render(&self, row: usize) -> String {
        match self {
            ColumnData::Str(v) => v[row].clone(),
            ColumnData::Timestamp(v) => v[row].format(TIMESTAMP_FORMAT).to_string(),
            ColumnData::Float(v) => v[row].map(|x| x.to_string()).unwrap_or_default(),
            ColumnData::Int(v) => v[row].map(|x| x.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableColumn {
    pub name: String,
    pub data: ColumnData,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableData {
    columns: Vec<TableColumn>,
}

impl TableData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column. The first column fixes the table height.
    pub fn with_column(mut self, name: impl Into<String>, data: ColumnData) -> Result<Self, TableError> {
        let name = name.into();
        if self.column(&name).is_some() {
            return Err(TableError::DuplicateColumn(name));
        }
        if let Some(first) = self.columns.first() {
            if first.data.len() != data.len() {
                return Err(TableError::LengthMismatch {
                    column: name,
                    expected: first.data.len(),
                    actual: data.len(),
                });
            }
        }
        self.columns.push(TableColumn { name, data });
        Ok(self)
    }

    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0
    }

    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.data)
    }

    pub fn require(&self, name: &str) -> Result<&ColumnData, TableError> {
        self.column(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    pub fn strings(&self, name: &str) -> Result<&[String], TableError> {
        match self.require(name)? {
            ColumnData::Str(v) => Ok(v),
            other => Err(type_mismatch(name, "string", other)),
        }
    }

    pub fn timestamps(&self, name: &str) -> Result<&[NaiveDateTime], TableError> {
        match self.require(name)? {
            ColumnData::Timestamp(v) => Ok(v),
            other => Err(type_mismatch(name, "timestamp", other)),
        }
    }

    pub fn floats(&self, name: &str) -> Result<&[Option<f64>], TableError> {
        match self.require(name)? {
            ColumnData::Float(v) => Ok(v),
            other => Err(type_mismatch(name, "float", other)),
        }
    }

    pub fn ints(&self, name: &str) -> Result<&[Option<i64>], TableError> {
        match self.require(name)? {
            ColumnData::Int(v) => Ok(v),
            other => Err(type_mismatch(name, "int", other)),
        }
    }

    /// `name:type` pairs, in column order.
    pub fn schema(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| format!("{}:{}", c.name, c.data.type_name()))
            .collect()
    }

    /// (slug, timestamp) of every row.
    pub fn row_keys(&self) -> Result<Vec<RowKey>, TableError> {
        let slugs = self.strings(SLUG)?;
        let timestamps = self.timestamps(TIMESTAMP)?;
        Ok(slugs
            .iter()
            .zip(timestamps)
            .map(|(s, &t)| RowKey::new(s.as_str(), t))
            .collect())
    }

    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|c| TableColumn {
                    name: c.name.clone(),
                    data: c.data.select(indices),
                })
                .collect(),
        }
    }

    pub fn select_latest(&self, policy: LatestPolicy) -> Result<Self, TableError> {
        let keys = self.row_keys()?;
        Ok(self.select_rows(&latest_indices(&keys, policy)))
    }

    /// Append `other`'s rows. Schemas (names, types, order) must match.
    pub fn vstack(mut self, other: TableData) -> Result<Self, TableError> {
        if self.schema() != other.schema() {
            return Err(TableError::SchemaMismatch {
                existing: self.schema().join(", "),
                incoming: other.schema().join(", "),
            });
        }
        for (column, incoming) in self.columns.iter_mut().zip(other.columns) {
            column.data.extend(incoming.data);
        }
        Ok(self)
    }

    /// Canonical CSV rendering: header row, then one record per row. Nulls
    /// render as empty fields; floats use the shortest exact representation.
    pub fn canonical_csv(&self) -> Result<Vec<u8>, TableError> {
        let render_err = |e: csv::Error| TableError::Render(e.to_string());
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(self.columns.iter().map(|c| c.name.as_str()))
            .map_err(render_err)?;
        for row in 0..self.height() {
            writer
                .write_record(self.columns.iter().map(|c| c.data.render(row)))
                .map_err(render_err)?;
        }
        writer
            .into_inner()
            .map_err(|e| TableError::Render(e.to_string()))
    }

    /// BLAKE3 hex digest of the canonical CSV rendering.
    pub fn content_hash(&self) -> Result<String, TableError> {
        Ok(blake3::hash(&self.canonical_csv()?).to_hex().to_string())
    }
}

fn type_mismatch(column: &str, expected: &'static str, actual: &ColumnData) -> TableError {
    TableError::TypeMismatch {
        column: column.to_string(),
        expected,
        actual: actual.type_name(),
    }
}

#[cfg(test)]
pub(crate) fn ts(day: u32) -> NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}
