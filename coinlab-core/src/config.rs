//! Indicator parameters.
//!
//! Every field has a default, so a partial TOML table (or none at all)
//! deserializes into a usable configuration. Call [`IndicatorConfig::validate`]
//! before handing a deserialized config to the pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Confidence level for VaR/CVaR, in (0, 1).
    pub confidence_level: f64,
    pub rsi_periods: Vec<usize>,
    pub atr_window: usize,
    pub cmf_period: usize,
    pub smi_period: usize,
    pub smi_smooth_k: usize,
    pub smi_smooth_d: usize,
    pub donchian_window: usize,
    pub roc_period: usize,
    pub williams_period: usize,
    pub cmo_period: usize,
    pub momentum_period: usize,
    pub tsi_short: usize,
    pub tsi_long: usize,
    pub keltner_ema: usize,
    pub keltner_multiplier: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            rsi_periods: vec![9, 18, 27, 54, 108],
            atr_window: 14,
            cmf_period: 20,
            smi_period: 14,
            smi_smooth_k: 3,
            smi_smooth_d: 3,
            donchian_window: 20,
            roc_period: 9,
            williams_period: 14,
            cmo_period: 14,
            momentum_period: 10,
            tsi_short: 13,
            tsi_long: 25,
            keltner_ema: 9,
            keltner_multiplier: 1.5,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum IndicatorConfigError {
    #[error("{field} must be >= 1")]
    ZeroPeriod { field: &'static str },

    #[error("confidence_level must be in (0, 1), got {0}")]
    Confidence(f64),

    #[error("keltner_multiplier must be finite and non-negative, got {0}")]
    Multiplier(f64),

    #[error("rsi_periods must not be empty")]
    NoRsiPeriods,
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<(), IndicatorConfigError> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(IndicatorConfigError::Confidence(self.confidence_level));
        }
        if !self.keltner_multiplier.is_finite() || self.keltner_multiplier < 0.0 {
            return Err(IndicatorConfigError::Multiplier(self.keltner_multiplier));
        }
        if self.rsi_periods.is_empty() {
            return Err(IndicatorConfigError::NoRsiPeriods);
        }
        if self.rsi_periods.contains(&0) {
            return Err(IndicatorConfigError::ZeroPeriod {
                field: "rsi_periods",
            });
        }
        let periods = [
            ("atr_window", self.atr_window),
            ("cmf_period", self.cmf_period),
            ("smi_period", self.smi_period),
            ("smi_smooth_k", self.smi_smooth_k),
            ("smi_smooth_d", self.smi_smooth_d),
            ("donchian_window", self.donchian_window),
            ("roc_period", self.roc_period),
            ("williams_period", self.williams_period),
            ("cmo_period", self.cmo_period),
            ("momentum_period", self.momentum_period),
            ("tsi_short", self.tsi_short),
            ("tsi_long", self.tsi_long),
            ("keltner_ema", self.keltner_ema),
        ];
        if let Some(&(field, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(IndicatorConfigError::ZeroPeriod { field });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(IndicatorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_input_fills_defaults() {
        let cfg: IndicatorConfig =
            serde_json::from_str(r#"{"atr_window": 7, "rsi_periods": [14]}"#).unwrap();
        assert_eq!(cfg.atr_window, 7);
        assert_eq!(cfg.rsi_periods, vec![14]);
        assert_eq!(cfg.confidence_level, 0.95);
        assert_eq!(cfg.donchian_window, 20);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cfg = IndicatorConfig {
            confidence_level: 1.0,
            ..IndicatorConfig::default()
        };
        assert_eq!(cfg.validate(), Err(IndicatorConfigError::Confidence(1.0)));

        let cfg = IndicatorConfig {
            cmf_period: 0,
            ..IndicatorConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(IndicatorConfigError::ZeroPeriod {
                field: "cmf_period"
            })
        );

        let cfg = IndicatorConfig {
            rsi_periods: Vec::new(),
            ..IndicatorConfig::default()
        };
        assert_eq!(cfg.validate(), Err(IndicatorConfigError::NoRsiPeriods));
    }
}
