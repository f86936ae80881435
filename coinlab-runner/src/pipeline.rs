//! Family and aggregate runs against a [`TableStore`].
//!
//! Each run reads its inputs, computes everything in memory, prepares every
//! output table (snapshots included, append schemas checked against what is
//! already stored) and only then writes. A run that fails before its first
//! write leaves the store untouched.

use std::collections::HashSet;

use coinlab_core::domain::{Asset, ObservationRow};
use coinlab_core::{
    aggregate, compose_scores, run_family_pass, AggregateError, AggregateOptions, Family,
    FrameError, NamedSignals, PipelineError, SignalCatalog, TimeSeriesFrame,
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{OutputSpec, RunConfig};
use crate::convert::{
    aggregated_to_table, assets_from_table, assets_to_table, frame_to_table,
    observations_from_table, observations_to_table, scores_to_table, signals_from_table,
    signals_to_table, ConvertError,
};
use crate::store::{StoreError, TableMeta, TableStore, WriteMode};
use crate::table::{TableData, TableError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("no input rows in '{table}'")]
    EmptyInput { table: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("family pass failed: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("aggregation failed: {0}")]
    Aggregate(#[from] AggregateError),

    #[error("cannot append to '{table}': {source}")]
    AppendSchema { table: String, source: TableError },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FamilyRunSummary {
    pub family: Family,
    pub rows: usize,
    pub slugs: usize,
    pub signals: usize,
    /// Indicators skipped for a missing input column.
    pub skipped: Vec<String>,
    pub written: Vec<TableMeta>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRunSummary {
    pub rows: usize,
    pub signal_columns: usize,
    /// Families whose signals table was absent or empty.
    pub missing: Vec<Family>,
    pub written: Vec<TableMeta>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunAllSummary {
    pub families: Vec<FamilyRunSummary>,
    pub failed: Vec<Family>,
    pub aggregate: AggregateRunSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestSummary {
    pub observations: Option<TableMeta>,
    pub listings: Option<TableMeta>,
}

/// Write raw observations and listings into the configured input tables.
pub fn ingest(
    store: &dyn TableStore,
    cfg: &RunConfig,
    observations: &[ObservationRow],
    listings: &[Asset],
    mode: WriteMode,
) -> Result<IngestSummary, RunError> {
    let observations = (!observations.is_empty())
        .then(|| observations_to_table(observations))
        .transpose()?;
    let listings = (!listings.is_empty())
        .then(|| assets_to_table(listings))
        .transpose()?;

    let mut summary = IngestSummary {
        observations: None,
        listings: None,
    };
    if let Some(table) = observations {
        summary.observations = Some(store.write(&cfg.input.ohlcv_table, &table, mode)?);
    }
    if let Some(table) = listings {
        summary.listings = Some(store.write(&cfg.input.listings_table, &table, mode)?);
    }
    info!(
        observations = summary.observations.as_ref().map_or(0, |m| m.rows),
        listings = summary.listings.as_ref().map_or(0, |m| m.rows),
        "ingested raw tables"
    );
    Ok(summary)
}

/// Slugs inside the rank limit, or `None` when there is no listings table.
fn ranked_slugs(store: &dyn TableStore, cfg: &RunConfig) -> Result<Option<HashSet<String>>, RunError> {
    let Some(table) = store.read(&cfg.input.listings_table)? else {
        info!(
            table = %cfg.input.listings_table,
            "no listings table, rank filter not applied"
        );
        return Ok(None);
    };
    let limit = cfg.input.rank_limit;
    let slugs = assets_from_table(&table)?
        .into_iter()
        .filter(|asset| asset.within_rank(limit))
        .map(|asset| asset.slug)
        .collect();
    Ok(Some(slugs))
}

fn load_frame(store: &dyn TableStore, cfg: &RunConfig) -> Result<TimeSeriesFrame, RunError> {
    let table_name = &cfg.input.ohlcv_table;
    let empty = || {
        error!(table = %table_name, "no input rows, run aborted");
        RunError::EmptyInput {
            table: table_name.clone(),
        }
    };

    let table = store.read(table_name)?.ok_or_else(empty)?;
    let mut rows = observations_from_table(&table)?;
    if let Some(allowed) = ranked_slugs(store, cfg)? {
        let before = rows.len();
        rows.retain(|row| allowed.contains(&row.slug));
        info!(
            kept = rows.len(),
            dropped = before - rows.len(),
            limit = cfg.input.rank_limit,
            "rank filter applied"
        );
    }
    if rows.is_empty() {
        return Err(empty());
    }
    Ok(TimeSeriesFrame::from_observations(rows)?)
}

/// Apply the output's snapshot policy. An append output must match the
/// schema of the table already stored under its name.
fn prepare(
    store: &dyn TableStore,
    spec: &OutputSpec,
    table: &TableData,
) -> Result<TableData, RunError> {
    let data = match spec.snapshot.policy() {
        None => table.clone(),
        Some(policy) => table.select_latest(policy)?,
    };
    if spec.mode == WriteMode::Append {
        if let Some(existing) = store.read(&spec.table)? {
            let (stored, incoming) = (existing.schema(), data.schema());
            if stored != incoming {
                error!(table = %spec.table, "append schema differs from stored table, run aborted");
                return Err(RunError::AppendSchema {
                    table: spec.table.clone(),
                    source: TableError::SchemaMismatch {
                        existing: stored.join(", "),
                        incoming: incoming.join(", "),
                    },
                });
            }
        }
    }
    Ok(data)
}

fn write_all(
    store: &dyn TableStore,
    prepared: Vec<(&OutputSpec, TableData)>,
) -> Result<Vec<TableMeta>, RunError> {
    prepared
        .into_iter()
        .map(|(spec, data)| {
            store
                .write(&spec.table, &data, spec.mode)
                .map_err(RunError::from)
        })
        .collect()
}

/// Compute one family and write its feature, signal and backtest tables.
pub fn run_family(
    store: &dyn TableStore,
    cfg: &RunConfig,
    family: Family,
) -> Result<FamilyRunSummary, RunError> {
    let frame = load_frame(store, cfg)?;
    let output = run_family_pass(frame, family, &cfg.indicators)?;

    let tables = cfg.families.get(family);
    let features = frame_to_table(&output.features)?;
    let signals = signals_to_table(&output.signals)?;

    let mut prepared = vec![
        (&tables.features, prepare(store, &tables.features, &features)?),
        (&tables.signals, prepare(store, &tables.signals, &signals)?),
    ];
    if let Some(backtest) = &tables.backtest {
        prepared.push((backtest, prepare(store, backtest, &features)?));
    }
    let written = write_all(store, prepared)?;

    let summary = FamilyRunSummary {
        family,
        rows: output.features.len(),
        slugs: output.features.partitions().len(),
        signals: output.signals.columns().len(),
        skipped: output.skipped,
        written,
    };
    info!(
        family = %family,
        rows = summary.rows,
        slugs = summary.slugs,
        tables = summary.written.len(),
        "family run complete"
    );
    Ok(summary)
}

/// Join every family's signals, score them, and write the results.
pub fn run_aggregate(store: &dyn TableStore, cfg: &RunConfig) -> Result<AggregateRunSummary, RunError> {
    let catalog = SignalCatalog::new();
    let mut named = Vec::new();
    let mut missing = Vec::new();

    for family in Family::ALL {
        let table_name = &cfg.families.get(family).signals.table;
        match store.read(table_name)? {
            Some(table) if !table.is_empty() => {
                let signals = catalog.tag(signals_from_table(&table)?);
                named.push(NamedSignals::new(table_name.as_str(), signals));
            }
            _ => {
                warn!(family = %family, table = %table_name, "signals table missing, aggregating without it");
                missing.push(family);
            }
        }
    }

    if named.is_empty() {
        error!("no signal tables found, aggregation aborted");
        return Err(RunError::EmptyInput {
            table: Family::ALL
                .iter()
                .map(|&f| cfg.families.get(f).signals.table.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    let options = AggregateOptions {
        reference_slug: cfg.reference_slug.clone(),
        duplicate_columns: cfg.duplicate_columns,
    };
    let aggregated = aggregate(&named, &options)?;
    let scores = compose_scores(&aggregated);

    let outputs = &cfg.aggregate;
    let all_signals = aggregated_to_table(&aggregated)?;
    let score_table = scores_to_table(&scores)?;
    let mut prepared = vec![
        (&outputs.all_signals, prepare(store, &outputs.all_signals, &all_signals)?),
        (&outputs.scores, prepare(store, &outputs.scores, &score_table)?),
    ];
    if let Some(latest) = &outputs.latest_scores {
        prepared.push((latest, prepare(store, latest, &score_table)?));
    }
    let written = write_all(store, prepared)?;

    let summary = AggregateRunSummary {
        rows: aggregated.keys().len(),
        signal_columns: aggregated.columns().len(),
        missing,
        written,
    };
    info!(
        rows = summary.rows,
        signal_columns = summary.signal_columns,
        missing = summary.missing.len(),
        "aggregate run complete"
    );
    Ok(summary)
}

/// Every family, then the aggregate.
///
/// A failing family is logged and left out; the aggregate then runs on the
/// families that succeeded. Fails only if every family fails or the
/// aggregate itself does.
pub fn run_all(store: &dyn TableStore, cfg: &RunConfig) -> Result<RunAllSummary, RunError> {
    let mut families = Vec::new();
    let mut failed = Vec::new();
    let mut first_error = None;

    for family in Family::ALL {
        match run_family(store, cfg, family) {
            Ok(summary) => families.push(summary),
            Err(err) => {
                error!(family = %family, error = %err, "family run failed");
                failed.push(family);
                first_error.get_or_insert(err);
            }
        }
    }

    if families.is_empty() {
        if let Some(err) = first_error {
            return Err(err);
        }
    }

    let aggregate = run_aggregate(store, cfg)?;
    Ok(RunAllSummary {
        families,
        failed,
        aggregate,
    })
}
