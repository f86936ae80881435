//! Indicator library.
//!
//! Every indicator is a pure function of one slug's rows: it declares the
//! frame columns it reads, receives them sliced to a single partition, and
//! returns one series per output column. [`compute_columns`] drives an
//! indicator across all partitions so no window ever spans two slugs.

pub mod atr;
pub mod cmf;
pub mod cmo;
pub mod donchian;
pub mod ema;
pub mod keltner;
pub mod momentum;
pub mod obv;
pub mod pct_change;
pub mod risk;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod smi;
pub mod tsi;
pub mod vwap;
pub mod williams_r;

pub use atr::Atr;
pub use cmf::Cmf;
pub use cmo::Cmo;
pub use donchian::Donchian;
pub use ema::Ema;
pub use keltner::Keltner;
pub use momentum::Momentum;
pub use obv::Obv;
pub use pct_change::PctChange;
pub use risk::Risk;
pub use roc::Roc;
pub use rsi::Rsi;
pub use sma::Sma;
pub use smi::Smi;
pub use tsi::Tsi;
pub use vwap::Vwap;
pub use williams_r::WilliamsR;

use thiserror::Error;

use crate::frame::{FrameError, TimeSeriesFrame};

/// A per-slug time-series transform.
///
/// # Look-ahead contamination guard
/// No output value at row t may depend on rows after t within the slug.
/// Per-slug scalar statistics (VaR/CVaR) are the one documented exception.
pub trait Indicator: Send + Sync {
    /// Human-readable name with parameters (e.g. "rsi_14").
    fn name(&self) -> &str;

    /// Frame columns read, in the order `compute` receives them.
    fn inputs(&self) -> &'static [&'static str];

    /// Output column names, before the family prefix is applied.
    fn outputs(&self) -> Vec<String>;

    /// Compute over a single slug's rows.
    ///
    /// `inputs` holds one slice per entry of [`inputs`](Self::inputs), all of
    /// the same length. Returns one series per output, each of that length.
    fn compute(&self, inputs: &[&[f64]]) -> Vec<Vec<f64>>;
}

#[derive(Debug, Error, PartialEq)]
pub enum IndicatorError {
    #[error("{indicator}: missing required column '{column}'")]
    MissingColumn { indicator: String, column: String },

    #[error("{indicator}: output column '{column}' already exists in the frame")]
    OutputExists { indicator: String, column: String },

    #[error("{indicator}: produced {actual} values where {expected} were expected")]
    OutputShape {
        indicator: String,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Compute `indicator` over every partition of `frame`.
///
/// Returns the prefixed output columns, ready to be added to the frame. The
/// frame itself is not touched, so a failing indicator leaves it intact.
pub fn compute_columns(
    frame: &TimeSeriesFrame,
    indicator: &dyn Indicator,
    prefix: &str,
) -> Result<Vec<(String, Vec<f64>)>, IndicatorError> {
    let inputs = indicator
        .inputs()
        .iter()
        .map(|&column| {
            frame.column(column).ok_or_else(|| IndicatorError::MissingColumn {
                indicator: indicator.name().to_string(),
                column: column.to_string(),
            })
        })
        .collect::<Result<Vec<&[f64]>, _>>()?;

    let names: Vec<String> = indicator
        .outputs()
        .into_iter()
        .map(|out| prefixed(prefix, &out))
        .collect();
    if let Some(existing) = names.iter().find(|n| frame.has_column(n)) {
        return Err(IndicatorError::OutputExists {
            indicator: indicator.name().to_string(),
            column: existing.clone(),
        });
    }

    let mut outputs: Vec<Vec<f64>> = vec![Vec::with_capacity(frame.len()); names.len()];
    for partition in frame.partitions() {
        let sliced: Vec<&[f64]> = inputs.iter().map(|c| &c[partition.range.clone()]).collect();
        let computed = indicator.compute(&sliced);
        if computed.len() != names.len() {
            return Err(IndicatorError::OutputShape {
                indicator: indicator.name().to_string(),
                expected: names.len(),
                actual: computed.len(),
            });
        }
        for (out, series) in outputs.iter_mut().zip(computed) {
            if series.len() != partition.range.len() {
                return Err(IndicatorError::OutputShape {
                    indicator: indicator.name().to_string(),
                    expected: partition.range.len(),
                    actual: series.len(),
                });
            }
            out.extend(series);
        }
    }

    Ok(names.into_iter().zip(outputs).collect())
}

/// Compute `indicator` and return the extended frame.
pub fn apply(
    frame: TimeSeriesFrame,
    indicator: &dyn Indicator,
    prefix: &str,
) -> Result<TimeSeriesFrame, IndicatorError> {
    let columns = compute_columns(&frame, indicator, prefix)?;
    let mut frame = frame;
    for (name, values) in columns {
        frame = frame.with_column(name, values)?;
    }
    Ok(frame)
}

/// `{prefix}_{name}`, or `name` alone for an empty prefix.
pub fn prefixed(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}_{name}")
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{make_frame, CLOSE};

    #[test]
    fn computes_per_partition_without_crossing_slugs() {
        let frame = make_frame(&[("bitcoin", &[10.0, 11.0]), ("ethereum", &[5.0, 6.0])]);
        let frame = apply(frame, &Momentum::new(1), "m_mom").unwrap();
        let mom = frame.column("m_mom_momentum").unwrap();
        assert!(mom[0].is_nan());
        assert_eq!(mom[1], 1.0);
        // First ethereum row must not difference against bitcoin's last close.
        assert!(mom[2].is_nan());
        assert_eq!(mom[3], 1.0);
    }

    #[test]
    fn missing_input_column_is_reported() {
        let frame = make_frame(&[("bitcoin", &[10.0, 11.0])]);
        let keys = frame.keys().to_vec();
        let close = frame.column(CLOSE).unwrap().to_vec();
        let only_close = TimeSeriesFrame::from_columns(keys, vec![(CLOSE.into(), close)]).unwrap();

        let err = compute_columns(&only_close, &Atr::new(14), "m_tvv").unwrap_err();
        assert_eq!(
            err,
            IndicatorError::MissingColumn {
                indicator: "atr_14".into(),
                column: "high".into(),
            }
        );
    }

    #[test]
    fn existing_output_column_is_reported() {
        let frame = make_frame(&[("bitcoin", &[10.0, 11.0])]);
        let frame = apply(frame, &Sma::new(2), "m_tvv").unwrap();
        let err = compute_columns(&frame, &Sma::new(2), "m_tvv").unwrap_err();
        assert!(matches!(err, IndicatorError::OutputExists { .. }));
    }

    #[test]
    fn prefix_joins_with_underscore() {
        assert_eq!(prefixed("d_pct", "1d"), "d_pct_1d");
        assert_eq!(prefixed("", "close"), "close");
    }
}
