//! The per-family pass: frame → indicators → normalization → signals.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{IndicatorConfig, IndicatorConfigError};
use crate::family::Family;
use crate::frame::{FrameError, TimeSeriesFrame, CLOSE};
use crate::indicators::{compute_columns, IndicatorError};
use crate::signals::{encode_all, SignalError, SignalTable};

#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("invalid indicator configuration: {0}")]
    Config(#[from] IndicatorConfigError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error(transparent)]
    Signal(#[from] SignalError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FamilyOutput {
    pub family: Family,
    /// Raw columns plus every indicator column that could be computed.
    pub features: TimeSeriesFrame,
    pub signals: SignalTable,
    /// Indicators skipped because an input column was missing.
    pub skipped: Vec<String>,
    /// Non-finite values replaced with null.
    pub nulled: usize,
}

/// Run one family over `frame`.
///
/// An indicator whose input column is missing is skipped and logged; its
/// columns (and any signal built on them) are simply absent. Everything
/// else that goes wrong aborts the pass.
pub fn run_family_pass(
    frame: TimeSeriesFrame,
    family: Family,
    cfg: &IndicatorConfig,
) -> Result<FamilyOutput, PipelineError> {
    cfg.validate()?;
    frame.require_present(CLOSE)?;

    let mut frame = frame;
    let mut skipped = Vec::new();
    for indicator in family.indicators(cfg) {
        match compute_columns(&frame, indicator.as_ref(), family.prefix()) {
            Ok(columns) => {
                debug!(family = %family, indicator = indicator.name(), "indicator computed");
                for (name, values) in columns {
                    frame = frame.with_column(name, values)?;
                }
            }
            Err(err @ IndicatorError::MissingColumn { .. }) => {
                warn!(family = %family, error = %err, "indicator skipped");
                skipped.push(indicator.name().to_string());
            }
            Err(err) => return Err(err.into()),
        }
    }

    let (features, nulled) = frame.normalize_degenerate();
    if nulled > 0 {
        info!(family = %family, nulled, "non-finite indicator values set to null");
    }

    let signals = encode_all(&features, &family.signals())?;
    info!(
        family = %family,
        rows = features.len(),
        slugs = features.partitions().len(),
        signals = signals.columns().len(),
        skipped = skipped.len(),
        "family pass complete"
    );

    Ok(FamilyOutput {
        family,
        features,
        signals,
        skipped,
        nulled,
    })
}
