//! Accumulation/Distribution line (ADL) and Chaikin Money Flow (CMF).
//!
//! ADL = ((close - low) - (high - close)) / (high - low) * volume
//! cum_ADL = running sum of ADL over the slug
//! CMF = rolling_sum(cum_ADL, period) / rolling_sum(volume, period)

use super::Indicator;
use crate::frame::{CLOSE, HIGH, LOW, VOLUME};
use crate::window::{cumsum, rolling_sum};

#[derive(Debug, Clone)]
pub struct Cmf {
    period: usize,
    name: String,
}

impl Cmf {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "CMF period must be >= 1");
        Self {
            period,
            name: format!("cmf_{period}"),
        }
    }
}

impl Indicator for Cmf {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[HIGH, LOW, CLOSE, VOLUME]
    }

    fn outputs(&self) -> Vec<String> {
        vec!["adl".to_string(), "cum_adl".to_string(), "cmf".to_string()]
    }

    fn compute(&self, inputs: &[&[f64]]) -> Vec<Vec<f64>> {
        let [high, low, close, volume] = inputs else {
            return Vec::new();
        };
        let adl: Vec<f64> = (0..close.len())
            .map(|i| {
                ((close[i] - low[i]) - (high[i] - close[i])) / (high[i] - low[i]) * volume[i]
            })
            .collect();
        let cum_adl = cumsum(&adl);
        let flow = rolling_sum(&cum_adl, self.period, 1);
        let vol = rolling_sum(volume, self.period, 1);
        let cmf = flow.iter().zip(&vol).map(|(f, v)| f / v).collect();
        vec![adl, cum_adl, cmf]
    }
}
