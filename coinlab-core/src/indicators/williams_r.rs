//! Williams %R.
//!
//! %R = (highest_high(period) - close) / (highest_high(period) - lowest_low(period)) * -100
//! Ranges over [-100, 0]; a zero-width range divides by zero.

use super::Indicator;
use crate::frame::{CLOSE, HIGH, LOW};
use crate::window::{rolling_max, rolling_min};

#[derive(Debug, Clone)]
pub struct WilliamsR {
    period: usize,
    name: String,
}

impl WilliamsR {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "Williams %R period must be >= 1");
        Self {
            period,
            name: format!("williams_r_{period}"),
        }
    }
}

impl Indicator for WilliamsR {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[HIGH, LOW, CLOSE]
    }

    fn outputs(&self) -> Vec<String> {
        vec!["williams_r".to_string()]
    }

    fn compute(&self, inputs: &[&[f64]]) -> Vec<Vec<f64>> {
        let [high, low, close] = inputs else {
            return Vec::new();
        };
        let hh = rolling_max(high, self.period, 1);
        let ll = rolling_min(low, self.period, 1);
        let wr = (0..close.len())
            .map(|i| (hh[i] - close[i]) / (hh[i] - ll[i]) * -100.0)
            .collect();
        vec![wr]
    }
}
