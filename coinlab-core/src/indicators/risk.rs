//! Return-distribution risk: cumulative return, historical VaR and CVaR.
//!
//! cum_return[t] = Π(1 + pct) - 1 over the slug up to t
//! VaR = the (1 - confidence) quantile of the slug's daily changes
//! CVaR = mean of the daily changes at or below VaR
//!
//! VaR and CVaR are per-slug scalars computed from the full history and
//! broadcast to every row of that slug; they are not rolling values.

use super::Indicator;
use crate::frame::CLOSE;
use crate::window::{cumprod, mean, pct_change, quantile};

#[derive(Debug, Clone)]
pub struct Risk {
    confidence: f64,
    name: String,
}

impl Risk {
    pub fn new(confidence: f64) -> Self {
        assert!(
            confidence > 0.0 && confidence < 1.0,
            "confidence must be in (0, 1)"
        );
        Self {
            confidence,
            name: format!("risk_{confidence}"),
        }
    }
}

impl Indicator for Risk {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[CLOSE]
    }

    fn outputs(&self) -> Vec<String> {
        vec![
            "cum_return".to_string(),
            "var".to_string(),
            "cvar".to_string(),
        ]
    }

    fn compute(&self, inputs: &[&[f64]]) -> Vec<Vec<f64>> {
        let [close] = inputs else {
            return Vec::new();
        };
        let n = close.len();
        // Changes off a zero close are infinite and excluded from the distribution.
        let pct: Vec<f64> = pct_change(close, 1)
            .into_iter()
            .map(|v| if v.is_finite() { v } else { f64::NAN })
            .collect();

        let growth: Vec<f64> = pct.iter().map(|p| 1.0 + p).collect();
        let cum_return = cumprod(&growth).into_iter().map(|g| g - 1.0).collect();

        let (var, cvar) = value_at_risk(&pct, self.confidence);
        vec![cum_return, vec![var; n], vec![cvar; n]]
    }
}

/// Historical (VaR, CVaR) of a return series at `confidence`.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> (f64, f64) {
    let var = quantile(returns, 1.0 - confidence);
    if var.is_nan() {
        return (f64::NAN, f64::NAN);
    }
    let tail: Vec<f64> = returns.iter().copied().filter(|&r| r <= var).collect();
    (var, mean(&tail))
}
