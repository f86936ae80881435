//! CoinLab Core: frames, indicators, signals, aggregation and scoring.
//!
//! This crate contains the pure computation of the pipeline:
//! - Domain types (assets, observation rows, row keys)
//! - `TimeSeriesFrame`, partitioned by slug, and shared windowing helpers
//! - Indicator library, grouped into families with column prefixes
//! - Signal encoding with explicit score-bucket tags
//! - Cross-family aggregation and bucket scores in [-100, 100]
//!
//! Nothing here touches the filesystem or the environment.

pub mod aggregate;
pub mod config;
pub mod domain;
pub mod family;
pub mod frame;
pub mod indicators;
pub mod pipeline;
pub mod score;
pub mod signals;
pub mod snapshot;
pub mod synthetic;
pub mod window;

pub use aggregate::{
    aggregate, AggregateError, AggregateOptions, AggregatedSignals, DuplicateColumnPolicy,
    NamedSignals,
};
pub use config::IndicatorConfig;
pub use family::{Family, SignalCatalog};
pub use frame::{FrameError, TimeSeriesFrame};
pub use pipeline::{run_family_pass, FamilyOutput, PipelineError};
pub use score::{compose_scores, ScoreBucket, ScoreTable};
pub use signals::{SignalColumn, SignalTable};
pub use snapshot::LatestPolicy;
