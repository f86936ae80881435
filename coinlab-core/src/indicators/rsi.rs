//! Relative Strength Index (RSI).
//!
//! gain = max(Δclose, 0), loss = max(-Δclose, 0)
//! avg_gain / avg_loss = EMA with alpha = 2/(period+1), seeded at the first
//! available change, no bias adjustment.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Edge cases follow IEEE division: avg_loss == 0 → RS = +inf → RSI = 100;
//! both zero → NaN. The first row of each slug has no change and is NaN.

use super::Indicator;
use crate::frame::CLOSE;
use crate::window::{diff, ewm_mean};

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
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
        vec![rsi(close, self.period)]
    }
}

/// RSI of a close series.
pub fn rsi(close: &[f64], period: usize) -> Vec<f64> {
    let delta = diff(close, 1);
    // NaN.max(0.0) would return 0.0, so keep missing deltas missing.
    let gain: Vec<f64> = delta
        .iter()
        .map(|&d| if d.is_nan() { d } else { d.max(0.0) })
        .collect();
    let loss: Vec<f64> = delta
        .iter()
        .map(|&d| if d.is_nan() { d } else { (-d).max(0.0) })
        .collect();

    let avg_gain = ewm_mean(&gain, period);
    let avg_loss = ewm_mean(&loss, period);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(&g, &l)| {
            let rs = g / l;
            100.0 - 100.0 / (1.0 + rs)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn rsi_all_gains_is_100() {
        let result = rsi(&[100.0, 101.0, 102.0, 103.0, 104.0], 3);
        assert!(result[0].is_nan());
        for &v in &result[1..] {
            assert_approx(v, 100.0, 1e-9);
        }
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let result = rsi(&[105.0, 104.0, 103.0, 102.0], 3);
        for &v in &result[1..] {
            assert_approx(v, 0.0, 1e-9);
        }
    }

    #[test]
    fn rsi_flat_series_is_undefined() {
        let result = rsi(&[10.0, 10.0, 10.0], 3);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_known_values() {
        // period 3 → alpha 0.5
        // deltas: +2, -1
        // avg_gain: 2, 1; avg_loss: 0, 0.5
        // RSI[1] = 100 (loss 0), RSI[2] = 100 - 100/(1+2) = 66.666...
        let result = rsi(&[10.0, 12.0, 11.0], 3);
        assert_approx(result[1], 100.0, 1e-9);
        assert_approx(result[2], 200.0 / 3.0, 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let result = rsi(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0], 9);
        for (i, &v) in result.iter().enumerate().skip(1) {
            assert!((0.0..=100.0).contains(&v), "RSI out of bounds at {i}: {v}");
        }
    }

    #[test]
    fn rsi_name_and_output() {
        let ind = Rsi::new(54);
        assert_eq!(ind.name(), "rsi_54");
        assert_eq!(ind.outputs(), vec!["rsi_54".to_string()]);
    }
}
