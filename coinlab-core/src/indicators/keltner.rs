//! Keltner Channel: EMA ± multiplier × ATR.
//!
//! - Middle: EMA(close, ema_period)
//! - Upper: middle + multiplier * ATR(atr_window)
//! - Lower: middle - multiplier * ATR(atr_window)

use super::atr::average_true_range;
use super::Indicator;
use crate::frame::{CLOSE, HIGH, LOW};
use crate::window::ewm_mean;

#[derive(Debug, Clone)]
pub struct Keltner {
    ema_period: usize,
    atr_window: usize,
    multiplier: f64,
    name: String,
}

impl Keltner {
    pub fn new(ema_period: usize, atr_window: usize, multiplier: f64) -> Self {
        assert!(
            ema_period >= 1 && atr_window >= 1,
            "Keltner windows must be >= 1"
        );
        Self {
            ema_period,
            atr_window,
            multiplier,
            name: format!("keltner_{ema_period}_{atr_window}_{multiplier}"),
        }
    }
}

impl Indicator for Keltner {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[HIGH, LOW, CLOSE]
    }

    fn outputs(&self) -> Vec<String> {
        vec![
            "keltner_mid".to_string(),
            "keltner_upper".to_string(),
            "keltner_lower".to_string(),
        ]
    }

    fn compute(&self, inputs: &[&[f64]]) -> Vec<Vec<f64>> {
        let [high, low, close] = inputs else {
            return Vec::new();
        };
        let mid = ewm_mean(close, self.ema_period);
        let atr = average_true_range(high, low, close, self.atr_window);
        let upper = mid
            .iter()
            .zip(&atr)
            .map(|(m, a)| m + self.multiplier * a)
            .collect();
        let lower = mid
            .iter()
            .zip(&atr)
            .map(|(m, a)| m - self.multiplier * a)
            .collect();
        vec![mid, upper, lower]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn keltner_bands_are_symmetric_around_ema() {
        let high = [11.0, 13.0, 12.0];
        let low = [9.0, 10.0, 10.0];
        let close = [10.0, 12.0, 11.0];
        let out = Keltner::new(9, 14, 1.5).compute(&[&high, &low, &close]);
        let (mid, upper, lower) = (&out[0], &out[1], &out[2]);
        for i in 0..3 {
            assert_approx(upper[i] - mid[i], mid[i] - lower[i], DEFAULT_EPSILON);
        }
        // row 0: ema 10, atr 2 → 10 ± 3
        assert_approx(upper[0], 13.0, DEFAULT_EPSILON);
        assert_approx(lower[0], 7.0, DEFAULT_EPSILON);
    }
}
