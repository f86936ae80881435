//! Encoding rules: how one row of indicator values becomes a {-1, 0, +1}
//! signal.

use crate::window::sign;

/// Threshold comparison. Strictness matters: `Gt(0.0)` and `Ge(0.0)` encode
/// a zero value differently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cmp {
    Gt(f64),
    Ge(f64),
    Lt(f64),
    Le(f64),
}

impl Cmp {
    pub fn holds(self, value: f64) -> bool {
        match self {
            Cmp::Gt(t) => value > t,
            Cmp::Ge(t) => value >= t,
            Cmp::Lt(t) => value < t,
            Cmp::Le(t) => value <= t,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// +1 when `bullish` holds, -1 when `bearish` holds, else 0.
    Threshold { bullish: Cmp, bearish: Cmp },
    /// Sign of the source value.
    Sign,
    /// Sign of (source - slow).
    Crossover { slow: String },
    /// +1 above `upper`, -1 below `lower`, 0 inside the band.
    Band { upper: String, lower: String },
    /// -1 when the source is at or below `floor`, else 0.
    TailBreach { floor: String },
}

impl Rule {
    pub fn threshold(bullish: Cmp, bearish: Cmp) -> Self {
        Rule::Threshold { bullish, bearish }
    }

    pub fn crossover(slow: impl Into<String>) -> Self {
        Rule::Crossover { slow: slow.into() }
    }

    pub fn band(upper: impl Into<String>, lower: impl Into<String>) -> Self {
        Rule::Band {
            upper: upper.into(),
            lower: lower.into(),
        }
    }

    pub fn tail_breach(floor: impl Into<String>) -> Self {
        Rule::TailBreach {
            floor: floor.into(),
        }
    }

    /// Frame columns the rule reads besides its source, in the order
    /// [`encode`](Self::encode) expects them.
    pub fn references(&self) -> Vec<&str> {
        match self {
            Rule::Threshold { .. } | Rule::Sign => Vec::new(),
            Rule::Crossover { slow } => vec![slow.as_str()],
            Rule::Band { upper, lower } => vec![upper.as_str(), lower.as_str()],
            Rule::TailBreach { floor } => vec![floor.as_str()],
        }
    }

    /// Encode one row. Any missing input yields a missing signal.
    pub fn encode(&self, source: f64, refs: &[f64]) -> Option<i8> {
        if source.is_nan() || refs.iter().any(|r| r.is_nan()) {
            return None;
        }
        match self {
            Rule::Threshold { bullish, bearish } => Some(if bullish.holds(source) {
                1
            } else if bearish.holds(source) {
                -1
            } else {
                0
            }),
            Rule::Sign => to_signal(sign(source)),
            Rule::Crossover { .. } => to_signal(sign(source - refs[0])),
            Rule::Band { .. } => Some(if source > refs[0] {
                1
            } else if source < refs[1] {
                -1
            } else {
                0
            }),
            Rule::TailBreach { .. } => Some(if source <= refs[0] { -1 } else { 0 }),
        }
    }
}

fn to_signal(s: f64) -> Option<i8> {
    if s.is_nan() {
        None
    } else {
        Some(s as i8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_threshold_leaves_boundary_neutral() {
        let roc = Rule::threshold(Cmp::Gt(0.0), Cmp::Lt(0.0));
        assert_eq!(roc.encode(0.0, &[]), Some(0));
        assert_eq!(roc.encode(1e-9, &[]), Some(1));
        assert_eq!(roc.encode(-1e-9, &[]), Some(-1));
    }

    #[test]
    fn inclusive_threshold_fires_on_boundary() {
        let smi = Rule::threshold(Cmp::Ge(25.0), Cmp::Le(-25.0));
        assert_eq!(smi.encode(25.0, &[]), Some(1));
        assert_eq!(smi.encode(-25.0, &[]), Some(-1));
        assert_eq!(smi.encode(24.9, &[]), Some(0));
    }

    #[test]
    fn missing_input_gives_missing_signal() {
        assert_eq!(Rule::Sign.encode(f64::NAN, &[]), None);
        assert_eq!(Rule::crossover("slow").encode(1.0, &[f64::NAN]), None);
    }

    #[test]
    fn crossover_and_band() {
        let cross = Rule::crossover("sma_18");
        assert_eq!(cross.encode(10.0, &[9.0]), Some(1));
        assert_eq!(cross.encode(9.0, &[9.0]), Some(0));
        assert_eq!(cross.encode(8.0, &[9.0]), Some(-1));

        let band = Rule::band("upper", "lower");
        assert_eq!(band.references(), vec!["upper", "lower"]);
        assert_eq!(band.encode(12.0, &[11.0, 9.0]), Some(1));
        assert_eq!(band.encode(11.0, &[11.0, 9.0]), Some(0));
        assert_eq!(band.encode(8.0, &[11.0, 9.0]), Some(-1));
    }

    #[test]
    fn tail_breach_is_bearish_only() {
        let tail = Rule::tail_breach("var");
        assert_eq!(tail.encode(-0.12, &[-0.12]), Some(-1));
        assert_eq!(tail.encode(0.3, &[-0.12]), Some(0));
    }
}
