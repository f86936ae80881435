//! Stochastic Momentum oscillator (SMI) as a %K/%D spread.
//!
//! %K = (close - LL) / (HH - LL) * 100 over `period`
//! smoothed_K = rolling mean of %K over `smooth_k`
//! %D = rolling mean of smoothed_K over `smooth_d`
//! SMI = smoothed_K - %D

use super::Indicator;
use crate::frame::{CLOSE, HIGH, LOW};
use crate::window::{rolling_max, rolling_mean, rolling_min};

#[derive(Debug, Clone)]
pub struct Smi {
    period: usize,
    smooth_k: usize,
    smooth_d: usize,
    name: String,
}

impl Smi {
    pub fn new(period: usize, smooth_k: usize, smooth_d: usize) -> Self {
        assert!(
            period >= 1 && smooth_k >= 1 && smooth_d >= 1,
            "SMI windows must be >= 1"
        );
        Self {
            period,
            smooth_k,
            smooth_d,
            name: format!("smi_{period}_{smooth_k}_{smooth_d}"),
        }
    }
}

impl Indicator for Smi {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[HIGH, LOW, CLOSE]
    }

    fn outputs(&self) -> Vec<String> {
        vec!["smi".to_string()]
    }

    fn compute(&self, inputs: &[&[f64]]) -> Vec<Vec<f64>> {
        let [high, low, close] = inputs else {
            return Vec::new();
        };
        let hh = rolling_max(high, self.period, 1);
        let ll = rolling_min(low, self.period, 1);
        let pct_k: Vec<f64> = (0..close.len())
            .map(|i| (close[i] - ll[i]) / (hh[i] - ll[i]) * 100.0)
            .collect();
        let smoothed_k = rolling_mean(&pct_k, self.smooth_k, 1);
        let pct_d = rolling_mean(&smoothed_k, self.smooth_d, 1);
        let smi = smoothed_k.iter().zip(&pct_d).map(|(k, d)| k - d).collect();
        vec![smi]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn smi_is_zero_on_first_row() {
        let high = [11.0, 12.0];
        let low = [9.0, 10.0];
        let close = [10.5, 11.5];
        let result = Smi::new(3, 1, 2).compute(&[&high, &low, &close]).remove(0);
        // smoothed_K == %D when only one value is available
        assert_approx(result[0], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn smi_known_values() {
        // period 2, smooth_k 1, smooth_d 2
        // %K row0: (10.5-9)/(11-9)*100 = 75
        // %K row1: hh 12, ll 9 → (11.5-9)/3*100 = 83.33..
        // %D row1 = mean(75, 83.33) = 79.166..; SMI = 83.33 - 79.166 = 4.1666..
        let high = [11.0, 12.0];
        let low = [9.0, 10.0];
        let close = [10.5, 11.5];
        let result = Smi::new(2, 1, 2).compute(&[&high, &low, &close]).remove(0);
        assert_approx(result[1], 250.0 / 60.0, 1e-9);
    }
}
