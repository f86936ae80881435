//! Rate of Change (ROC).
//!
//! ROC[t] = (close[t] - close[t-period]) / close[t-period] * 100
//! The first `period` rows of a slug have no prior close and stay NaN.

use super::Indicator;
use crate::frame::CLOSE;
use crate::window::shift;

#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
    name: String,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ROC period must be >= 1");
        Self {
            period,
            name: format!("roc_{period}"),
        }
    }
}

impl Indicator for Roc {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[CLOSE]
    }

    fn outputs(&self) -> Vec<String> {
        vec!["roc".to_string()]
    }

    fn compute(&self, inputs: &[&[f64]]) -> Vec<Vec<f64>> {
        let [close] = inputs else {
            return Vec::new();
        };
        let prev = shift(close, self.period);
        let roc = close
            .iter()
            .zip(&prev)
            .map(|(&curr, &prev)| (curr - prev) / prev * 100.0)
            .collect();
        vec![roc]
    }
}
