//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a lookback window, emitted from the
//! first row onward using however many rows are available.

use super::Indicator;
use crate::frame::CLOSE;
use crate::window::rolling_mean;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
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
        vec![rolling_mean(close, self.period, 1)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn sma_3_with_partial_warmup() {
        let closes = [10.0, 11.0, 12.0, 13.0, 14.0];
        let result = Sma::new(3).compute(&[&closes]).remove(0);
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], 10.5, DEFAULT_EPSILON);
        assert_approx(result[2], 11.0, DEFAULT_EPSILON);
        assert_approx(result[3], 12.0, DEFAULT_EPSILON);
        assert_approx(result[4], 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let closes = [100.0, 200.0, 300.0];
        let result = Sma::new(1).compute(&[&closes]).remove(0);
        assert_eq!(result, closes.to_vec());
    }

    #[test]
    fn sma_skips_missing_close() {
        let closes = [10.0, f64::NAN, 14.0];
        let result = Sma::new(3).compute(&[&closes]).remove(0);
        assert_approx(result[1], 10.0, DEFAULT_EPSILON);
        assert_approx(result[2], 12.0, DEFAULT_EPSILON);
    }
}
