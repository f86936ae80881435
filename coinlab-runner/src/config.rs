//! Run configuration, loaded from TOML.
//!
//! Every output table is an [`OutputSpec`]: its name, its write mode and the
//! rows it keeps. Omitted sections take their defaults, so an empty file is
//! a complete configuration.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use coinlab_core::config::{IndicatorConfig, IndicatorConfigError};
use coinlab_core::{DuplicateColumnPolicy, Family, LatestPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::WriteMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error(transparent)]
    Indicators(#[from] IndicatorConfigError),

    #[error("table '{0}' is used by more than one output")]
    DuplicateTable(String),

    #[error("output table '{0}' is also an input table")]
    OutputIsInput(String),

    #[error("reference_slug must not be empty")]
    EmptyReferenceSlug,
}

/// Which rows of a computed table are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Snapshot {
    /// Every row.
    #[default]
    Full,
    /// Rows at the latest timestamp across all slugs.
    GlobalLatest,
    /// Each slug's own latest row.
    PerSlugLatest,
}

impl Snapshot {
    pub fn policy(self) -> Option<LatestPolicy> {
        match self {
            Snapshot::Full => None,
            Snapshot::GlobalLatest => Some(LatestPolicy::Global),
            Snapshot::PerSlugLatest => Some(LatestPolicy::PerSlug),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub table: String,
    #[serde(default)]
    pub mode: WriteMode,
    #[serde(default)]
    pub snapshot: Snapshot,
}

impl OutputSpec {
    pub fn replace(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            mode: WriteMode::Replace,
            snapshot: Snapshot::Full,
        }
    }

    pub fn append(table: impl Into<String>, snapshot: Snapshot) -> Self {
        Self {
            table: table.into(),
            mode: WriteMode::Append,
            snapshot,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub root: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub ohlcv_table: String,
    pub listings_table: String,
    /// Keep slugs whose listing rank is at most this.
    pub rank_limit: u32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            ohlcv_table: "ohlcv".to_string(),
            listings_table: "listings".to_string(),
            rank_limit: 1000,
        }
    }
}

/// Output tables of one family.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyTables {
    pub features: OutputSpec,
    pub signals: OutputSpec,
    pub backtest: Option<OutputSpec>,
}

impl FamilyTables {
    fn defaults(family: Family) -> Self {
        let name = family.name();
        Self {
            features: OutputSpec::replace(format!("{name}_features")),
            signals: OutputSpec::replace(format!("{name}_signals")),
            backtest: Some(OutputSpec::append(
                format!("{name}_features_backtest"),
                Snapshot::GlobalLatest,
            )),
        }
    }

    fn specs(&self) -> impl Iterator<Item = &OutputSpec> {
        [&self.features, &self.signals]
            .into_iter()
            .chain(self.backtest.as_ref())
    }
}

/// A family section as written in TOML. Missing keys take the family's
/// defaults; `no_backtest = true` drops the backtest table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct FamilySection {
    #[serde(skip_serializing_if = "Option::is_none")]
    features: Option<OutputSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    signals: Option<OutputSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    backtest: Option<OutputSpec>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    no_backtest: bool,
}

impl FamilySection {
    fn resolve(self, family: Family) -> FamilyTables {
        let defaults = FamilyTables::defaults(family);
        FamilyTables {
            features: self.features.unwrap_or(defaults.features),
            signals: self.signals.unwrap_or(defaults.signals),
            backtest: if self.no_backtest {
                None
            } else {
                self.backtest.or(defaults.backtest)
            },
        }
    }
}

impl From<FamilyTables> for FamilySection {
    fn from(tables: FamilyTables) -> Self {
        Self {
            features: Some(tables.features),
            signals: Some(tables.signals),
            no_backtest: tables.backtest.is_none(),
            backtest: tables.backtest,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct FamilySections {
    momentum: FamilySection,
    tvv: FamilySection,
    pct_change: FamilySection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FamilySections", into = "FamilySections")]
pub struct FamilyOutputs {
    pub momentum: FamilyTables,
    pub tvv: FamilyTables,
    pub pct_change: FamilyTables,
}

impl Default for FamilyOutputs {
    fn default() -> Self {
        FamilySections::default().into()
    }
}

impl From<FamilySections> for FamilyOutputs {
    fn from(sections: FamilySections) -> Self {
        Self {
            momentum: sections.momentum.resolve(Family::Momentum),
            tvv: sections.tvv.resolve(Family::Tvv),
            pct_change: sections.pct_change.resolve(Family::PctChange),
        }
    }
}

impl From<FamilyOutputs> for FamilySections {
    fn from(outputs: FamilyOutputs) -> Self {
        Self {
            momentum: outputs.momentum.into(),
            tvv: outputs.tvv.into(),
            pct_change: outputs.pct_change.into(),
        }
    }
}

impl FamilyOutputs {
    pub fn get(&self, family: Family) -> &FamilyTables {
        match family {
            Family::Momentum => &self.momentum,
            Family::Tvv => &self.tvv,
            Family::PctChange => &self.pct_change,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateOutputs {
    pub all_signals: OutputSpec,
    pub scores: OutputSpec,
    /// Per-asset latest scores.
    pub latest_scores: Option<OutputSpec>,
}

impl Default for AggregateOutputs {
    fn default() -> Self {
        Self {
            all_signals: OutputSpec::replace("all_signals"),
            scores: OutputSpec::replace("scores"),
            latest_scores: Some(OutputSpec {
                table: "scores_latest".to_string(),
                mode: WriteMode::Replace,
                snapshot: Snapshot::PerSlugLatest,
            }),
        }
    }
}

impl AggregateOutputs {
    fn specs(&self) -> impl Iterator<Item = &OutputSpec> {
        [&self.all_signals, &self.scores]
            .into_iter()
            .chain(self.latest_scores.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub store: StoreConfig,
    pub input: InputConfig,
    pub indicators: IndicatorConfig,
    pub families: FamilyOutputs,
    pub aggregate: AggregateOutputs,
    /// Slug whose rows survive aggregation even with missing signals.
    pub reference_slug: String,
    pub duplicate_columns: DuplicateColumnPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            input: InputConfig::default(),
            indicators: IndicatorConfig::default(),
            families: FamilyOutputs::default(),
            aggregate: AggregateOutputs::default(),
            reference_slug: "bitcoin".to_string(),
            duplicate_columns: DuplicateColumnPolicy::default(),
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indicators.validate()?;
        if self.reference_slug.trim().is_empty() {
            return Err(ConfigError::EmptyReferenceSlug);
        }

        let inputs = [&self.input.ohlcv_table, &self.input.listings_table];
        let mut seen = HashSet::new();
        let outputs = Family::ALL
            .iter()
            .flat_map(|&f| self.families.get(f).specs())
            .chain(self.aggregate.specs());
        for spec in outputs {
            if inputs.contains(&&spec.table) {
                return Err(ConfigError::OutputIsInput(spec.table.clone()));
            }
            if !seen.insert(spec.table.as_str()) {
                return Err(ConfigError::DuplicateTable(spec.table.clone()));
            }
        }
        Ok(())
    }
}
