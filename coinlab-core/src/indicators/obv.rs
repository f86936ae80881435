//! On-Balance Volume (OBV) and its daily percentage change.
//!
//! OBV[0] = 0, OBV[t] = Σ_{j<t} sign(close[j] - close[j-1]) * volume[j]
//!
//! The current row's signed volume is only folded in on the next row, so
//! OBV at t uses prices and volumes up to t-1. The first row has no prior
//! close and contributes nothing.

use super::Indicator;
use crate::frame::{CLOSE, VOLUME};
use crate::window::{diff, pct_change, sign};

#[derive(Debug, Clone, Default)]
pub struct Obv;

impl Obv {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Obv {
    fn name(&self) -> &str {
        "obv"
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[CLOSE, VOLUME]
    }

    fn outputs(&self) -> Vec<String> {
        vec!["obv".to_string(), "obv_pct".to_string()]
    }

    fn compute(&self, inputs: &[&[f64]]) -> Vec<Vec<f64>> {
        let [close, volume] = inputs else {
            return Vec::new();
        };
        let obv = on_balance_volume(close, volume);
        let obv_pct = pct_change(&obv, 1);
        vec![obv, obv_pct]
    }
}

pub fn on_balance_volume(close: &[f64], volume: &[f64]) -> Vec<f64> {
    let delta = diff(close, 1);
    let mut obv = Vec::with_capacity(close.len());
    let mut acc = 0.0;
    for (d, &v) in delta.iter().zip(volume) {
        obv.push(acc);
        let signed = sign(*d) * v;
        if !signed.is_nan() {
            acc += signed;
        }
    }
    obv
}
