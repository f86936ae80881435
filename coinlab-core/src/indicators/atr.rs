//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! TR[0] = high - low, since there is no previous close.
//! ATR = rolling mean of TR over `window`.

use super::Indicator;
use crate::frame::{CLOSE, HIGH, LOW};
use crate::window::rolling_mean;

#[derive(Debug, Clone)]
pub struct Atr {
    window: usize,
    name: String,
}

impl Atr {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "ATR window must be >= 1");
        Self {
            window,
            name: format!("atr_{window}"),
        }
    }
}

/// True Range series. A missing previous close falls back to high - low.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    (0..high.len())
        .map(|i| {
            let range = high[i] - low[i];
            if i == 0 || close[i - 1].is_nan() {
                return range;
            }
            let pc = close[i - 1];
            range.max((high[i] - pc).abs()).max((low[i] - pc).abs())
        })
        .collect()
}

pub fn average_true_range(high: &[f64], low: &[f64], close: &[f64], window: usize) -> Vec<f64> {
    rolling_mean(&true_range(high, low, close), window, 1)
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[HIGH, LOW, CLOSE]
    }

    fn outputs(&self) -> Vec<String> {
        vec!["atr".to_string()]
    }

    fn compute(&self, inputs: &[&[f64]]) -> Vec<Vec<f64>> {
        let [high, low, close] = inputs else {
            return Vec::new();
        };
        vec![average_true_range(high, low, close, self.window)]
    }
}
