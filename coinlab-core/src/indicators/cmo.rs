//! Chande Momentum Oscillator (CMO).
//!
//! CMO = (Σgain - Σloss) / (Σgain + Σloss) * 100 over `period` changes.
//! The first row has no change; its windows hold no values and stay NaN.

use super::Indicator;
use crate::frame::CLOSE;
use crate::window::{diff, rolling_sum};

#[derive(Debug, Clone)]
pub struct Cmo {
    period: usize,
    name: String,
}

impl Cmo {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "CMO period must be >= 1");
        Self {
            period,
            name: format!("cmo_{period}"),
        }
    }
}

impl Indicator for Cmo {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[CLOSE]
    }

    fn outputs(&self) -> Vec<String> {
        vec!["cmo".to_string()]
    }

    fn compute(&self, inputs: &[&[f64]]) -> Vec<Vec<f64>> {
        let [close] = inputs else {
            return Vec::new();
        };
        let delta = diff(close, 1);
        let gain: Vec<f64> = delta
            .iter()
            .map(|&d| if d.is_nan() { d } else { d.max(0.0) })
            .collect();
        let loss: Vec<f64> = delta
            .iter()
            .map(|&d| if d.is_nan() { d } else { (-d).max(0.0) })
            .collect();

        let sum_gain = rolling_sum(&gain, self.period, 1);
        let sum_loss = rolling_sum(&loss, self.period, 1);
        let cmo = sum_gain
            .iter()
            .zip(&sum_loss)
            .map(|(g, l)| (g - l) / (g + l) * 100.0)
            .collect();
        vec![cmo]
    }
}
