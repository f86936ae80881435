//! Cumulative Volume-Weighted Average Price (VWAP).
//!
//! VWAP[t] = Σ_{j<=t} typical[j] * volume[j] / Σ_{j<=t} volume[j]
//! typical = (high + low + close) / 3. Both sums run from the start of the
//! slug and never reset.

use super::Indicator;
use crate::frame::{CLOSE, HIGH, LOW, VOLUME};
use crate::window::cumsum;

#[derive(Debug, Clone, Default)]
pub struct Vwap;

impl Vwap {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        "vwap"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[HIGH, LOW, CLOSE, VOLUME]
    }

    fn outputs(&self) -> Vec<String> {
        vec!["vwap".to_string()]
    }

    fn compute(&self, inputs: &[&[f64]]) -> Vec<Vec<f64>> {
        let [high, low, close, volume] = inputs else {
            return Vec::new();
        };
        let pv: Vec<f64> = (0..close.len())
            .map(|i| (high[i] + low[i] + close[i]) / 3.0 * volume[i])
            .collect();
        let cum_pv = cumsum(&pv);
        let cum_vol = cumsum(volume);
        let vwap = cum_pv.iter().zip(&cum_vol).map(|(pv, v)| pv / v).collect();
        vec![vwap]
    }
}
