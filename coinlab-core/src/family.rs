//! Indicator families: which indicators are computed together, under which
//! column prefix, and which signals are encoded from them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::IndicatorConfig;
use crate::frame::CLOSE;
use crate::indicators::{
    Atr, Cmf, Cmo, Donchian, Ema, Indicator, Keltner, Momentum, Obv, PctChange, Risk, Roc, Rsi,
    Sma, Smi, Tsi, Vwap, WilliamsR,
};
use crate::score::ScoreBucket;
use crate::signals::{Cmp, Rule, SignalSpec, SignalTable};

/// Moving-average periods of the TVV family; the crossover signals pair
/// them as 9/18 and 21/108.
const MA_PERIODS: [usize; 4] = [9, 18, 21, 108];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Momentum,
    Tvv,
    PctChange,
}

impl Family {
    pub const ALL: [Family; 3] = [Family::Momentum, Family::Tvv, Family::PctChange];

    pub fn name(self) -> &'static str {
        match self {
            Family::Momentum => "momentum",
            Family::Tvv => "tvv",
            Family::PctChange => "pct_change",
        }
    }

    /// Column prefix of the family's indicator columns.
    pub fn prefix(self) -> &'static str {
        match self {
            Family::Momentum => "m_mom",
            Family::Tvv => "m_tvv",
            Family::PctChange => "d_pct",
        }
    }

    pub fn indicators(self, cfg: &IndicatorConfig) -> Vec<Box<dyn Indicator>> {
        match self {
            Family::Momentum => {
                let mut out: Vec<Box<dyn Indicator>> = cfg
                    .rsi_periods
                    .iter()
                    .map(|&p| Box::new(Rsi::new(p)) as Box<dyn Indicator>)
                    .collect();
                out.push(Box::new(Roc::new(cfg.roc_period)));
                out.push(Box::new(WilliamsR::new(cfg.williams_period)));
                out.push(Box::new(Smi::new(
                    cfg.smi_period,
                    cfg.smi_smooth_k,
                    cfg.smi_smooth_d,
                )));
                out.push(Box::new(Cmo::new(cfg.cmo_period)));
                out.push(Box::new(Momentum::new(cfg.momentum_period)));
                out.push(Box::new(Tsi::new(cfg.tsi_short, cfg.tsi_long)));
                out
            }
            Family::Tvv => {
                let mut out: Vec<Box<dyn Indicator>> = Vec::new();
                for p in MA_PERIODS {
                    out.push(Box::new(Sma::new(p)));
                }
                for p in MA_PERIODS {
                    out.push(Box::new(Ema::new(p)));
                }
                out.push(Box::new(Obv::new()));
                out.push(Box::new(Atr::new(cfg.atr_window)));
                out.push(Box::new(Keltner::new(
                    cfg.keltner_ema,
                    cfg.atr_window,
                    cfg.keltner_multiplier,
                )));
                out.push(Box::new(Donchian::new(cfg.donchian_window)));
                out.push(Box::new(Vwap::new()));
                out.push(Box::new(Cmf::new(cfg.cmf_period)));
                out
            }
            Family::PctChange => vec![
                Box::new(PctChange::new()),
                Box::new(Risk::new(cfg.confidence_level)),
            ],
        }
    }

    pub fn signals(self) -> Vec<SignalSpec> {
        match self {
            Family::Momentum => {
                let threshold = |name: &str, bullish, bearish| {
                    SignalSpec::new(
                        format!("m_mom_{name}_sig"),
                        format!("m_mom_{name}"),
                        Rule::threshold(bullish, bearish),
                        ScoreBucket::Momentum,
                    )
                };
                vec![
                    threshold("roc", Cmp::Gt(0.0), Cmp::Lt(0.0)),
                    threshold("williams_r", Cmp::Gt(-50.0), Cmp::Lt(-50.0)),
                    threshold("smi", Cmp::Ge(25.0), Cmp::Le(-25.0)),
                    threshold("cmo", Cmp::Gt(40.0), Cmp::Lt(-40.0)),
                    threshold("momentum", Cmp::Gt(4000.0), Cmp::Lt(-4000.0)),
                ]
            }
            Family::Tvv => {
                let cross = |kind: &str, fast: usize, slow: usize| {
                    SignalSpec::new(
                        format!("m_tvv_{kind}_{fast}_{slow}_sig"),
                        format!("m_tvv_{kind}_{fast}"),
                        Rule::crossover(format!("m_tvv_{kind}_{slow}")),
                        ScoreBucket::Momentum,
                    )
                };
                vec![
                    cross("sma", 9, 18),
                    cross("ema", 9, 18),
                    cross("sma", 21, 108),
                    cross("ema", 21, 108),
                    SignalSpec::new(
                        "m_tvv_obv_pct_sig",
                        "m_tvv_obv_pct",
                        Rule::Sign,
                        ScoreBucket::Momentum,
                    ),
                    SignalSpec::new("m_tvv_cmf_sig", "m_tvv_cmf", Rule::Sign, ScoreBucket::Momentum),
                    SignalSpec::new(
                        "v_tvv_vwap_sig",
                        CLOSE,
                        Rule::crossover("m_tvv_vwap"),
                        ScoreBucket::Valuation,
                    ),
                    SignalSpec::new(
                        "v_tvv_keltner_sig",
                        CLOSE,
                        Rule::band("m_tvv_keltner_upper", "m_tvv_keltner_lower"),
                        ScoreBucket::Valuation,
                    ),
                ]
            }
            Family::PctChange => vec![
                SignalSpec::new("d_pct_1d_sig", "d_pct_1d", Rule::Sign, ScoreBucket::Durability),
                SignalSpec::new(
                    "d_pct_cum_return_sig",
                    "d_pct_cum_return",
                    Rule::Sign,
                    ScoreBucket::Durability,
                ),
                SignalSpec::new(
                    "d_pct_tail_sig",
                    "d_pct_1d",
                    Rule::tail_breach("d_pct_var"),
                    ScoreBucket::Durability,
                ),
            ],
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFamily(pub String);

impl fmt::Display for UnknownFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown family '{}' (expected momentum, tvv or pct_change)",
            self.0
        )
    }
}

impl std::error::Error for UnknownFamily {}

impl FromStr for Family {
    type Err = UnknownFamily;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Family::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| UnknownFamily(s.to_string()))
    }
}

/// Registry of every known signal column and its score bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalCatalog {
    buckets: BTreeMap<String, ScoreBucket>,
}

impl SignalCatalog {
    pub fn new() -> Self {
        let buckets = Family::ALL
            .into_iter()
            .flat_map(Family::signals)
            .map(|spec| (spec.name, spec.bucket))
            .collect();
        Self { buckets }
    }

    pub fn bucket(&self, signal: &str) -> Option<ScoreBucket> {
        self.buckets.get(signal).copied()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Attach buckets to untagged columns. Columns the catalog does not know
    /// stay untagged: they still count in tallies but never in a score.
    pub fn tag(&self, table: SignalTable) -> SignalTable {
        table.map_columns(|mut column| {
            if column.bucket.is_none() {
                column.bucket = self.bucket(&column.name);
                if column.bucket.is_none() {
                    warn!(column = %column.name, "signal column not in catalog, excluded from scoring");
                }
            }
            column
        })
    }
}

impl Default for SignalCatalog {
    fn default() -> Self {
        Self::new()
    }
}
