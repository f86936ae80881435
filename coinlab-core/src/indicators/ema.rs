//! Exponential Moving Average (EMA).
//!
//! EMA[t] = alpha * close[t] + (1 - alpha) * EMA[t-1], alpha = 2/(period+1)
//! Seed: EMA[0] = close[0] (no bias adjustment, no SMA seed).

use super::Indicator;
use crate::frame::CLOSE;
use crate::window::ewm_mean;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[CLOSE]
    }

    fn outputs(&self) -> Vec<String> {
        vec![self.name.clone()]
    }

    fn compute(&self, inputs: &[&[f64]]) -> Vec<Vec<f64>> {
        let [close] = inputs else {
            return Vec::new();
        };
        vec![ewm_mean(close, self.period)]
    }
}
