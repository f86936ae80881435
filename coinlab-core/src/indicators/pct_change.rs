//! One-day percentage change of close.
//!
//! pct[t] = close[t] / close[t-1] - 1; the first row of each slug is NaN.

use super::Indicator;
use crate::frame::CLOSE;
use crate::window::pct_change;

#[derive(Debug, Clone, Default)]
pub struct PctChange;

impl PctChange {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for PctChange {
    fn name(&self) -> &str {
        "pct_change_1d"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[CLOSE]
    }

    fn outputs(&self) -> Vec<String> {
        vec!["1d".to_string()]
    }

    fn compute(&self, inputs: &[&[f64]]) -> Vec<Vec<f64>> {
        let [close] = inputs else {
            return Vec::new();
        };
        vec![pct_change(close, 1)]
    }
}
