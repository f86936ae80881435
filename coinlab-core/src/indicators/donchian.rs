//! Donchian Channel: highest high / lowest low over a lookback window.
//!
//! - Upper: max(high[t-window+1..=t])
//! - Lower: min(low[t-window+1..=t])
//! Partial windows at the start of a slug use the rows available.

use super::Indicator;
use crate::frame::{HIGH, LOW};
use crate::window::{rolling_max, rolling_min};

#[derive(Debug, Clone)]
pub struct Donchian {
    window: usize,
    name: String,
}

impl Donchian {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "Donchian window must be >= 1");
        Self {
            window,
            name: format!("donchian_{window}"),
        }
    }
}

impl Indicator for Donchian {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &'static [&'static str] {
        &[HIGH, LOW]
    }

    fn outputs(&self) -> Vec<String> {
        vec!["donchian_upper".to_string(), "donchian_lower".to_string()]
    }

    fn compute(&self, inputs: &[&[f64]]) -> Vec<Vec<f64>> {
        let [high, low] = inputs else {
            return Vec::new();
        };
        vec![
            rolling_max(high, self.window, 1),
            rolling_min(low, self.window, 1),
        ]
    }
}
