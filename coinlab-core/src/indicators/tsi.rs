//! True Strength Index (TSI).
//!
//! TSI = 100 * EMA_short(EMA_long(Δclose)) / EMA_short(EMA_long(|Δclose|))
//! Both smoothing passes use the no-bias-adjustment EMA seeded at the first
//! available change.

use super::Indicator;
use crate::frame::CLOSE;
use crate::window::{diff, ewm_mean};

#[derive(Debug, Clone)]
pub struct Tsi {
    short: usize,
    long: usize,
    name: String,
}

impl Tsi {
    pub fn new(short: usize, long: usize) -> Self {
        assert!(short >= 1 && long >= 1, "TSI spans must be >= 1");
        Self {
            short,
            long,
            name: format!("tsi_{short}_{long}"),
        }
    }
}

impl Indicator for Tsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[CLOSE]
    }

    fn outputs(&self) -> Vec<String> {
        vec!["tsi".to_string()]
    }

    fn compute(&self, inputs: &[&[f64]]) -> Vec<Vec<f64>> {
        let [close] = inputs else {
            return Vec::new();
        };
        let delta = diff(close, 1);
        let abs_delta: Vec<f64> = delta.iter().map(|d| d.abs()).collect();

        let smoothed = ewm_mean(&ewm_mean(&delta, self.long), self.short);
        let smoothed_abs = ewm_mean(&ewm_mean(&abs_delta, self.long), self.short);

        let tsi = smoothed
            .iter()
            .zip(&smoothed_abs)
            .map(|(s, a)| 100.0 * s / a)
            .collect();
        vec![tsi]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn tsi_monotonic_rise_is_100() {
        let closes = [1.0, 2.0, 4.0, 5.0, 9.0];
        let result = Tsi::new(13, 25).compute(&[&closes]).remove(0);
        assert!(result[0].is_nan());
        for &v in &result[1..] {
            assert_approx(v, 100.0, 1e-9);
        }
    }

    #[test]
    fn tsi_is_bounded() {
        let closes = [10.0, 12.0, 9.0, 11.0, 8.0, 13.0];
        let result = Tsi::new(2, 3).compute(&[&closes]).remove(0);
        for &v in &result[1..] {
            assert!((-100.0..=100.0).contains(&v), "TSI out of bounds: {v}");
        }
    }
}
