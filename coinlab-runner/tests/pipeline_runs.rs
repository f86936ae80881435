//! Family and aggregate runs against a Parquet store in a temp directory.

use coinlab_core::synthetic::{generate, SyntheticSpec, SyntheticUniverse};
use coinlab_core::{Family, ScoreBucket};
use coinlab_runner::{
    ingest, run_aggregate, run_all, run_family, ParquetStore, RunConfig, RunError, TableStore,
    WriteMode,
};
use tempfile::TempDir;

fn universe(assets: usize) -> SyntheticUniverse {
    generate(&SyntheticSpec {
        assets,
        days: 60,
        seed: 7,
        ..SyntheticSpec::default()
    })
}

fn seeded_store(assets: usize) -> (TempDir, ParquetStore, RunConfig) {
    let dir = TempDir::new().unwrap();
    let store = ParquetStore::new(dir.path());
    let cfg = RunConfig::default();
    let data = universe(assets);
    ingest(&store, &cfg, &data.observations, &data.assets, WriteMode::Replace).unwrap();
    (dir, store, cfg)
}

#[test]
fn family_run_writes_features_signals_and_backtest() {
    let (_dir, store, cfg) = seeded_store(3);

    let summary = run_family(&store, &cfg, Family::Tvv).unwrap();
    assert_eq!(summary.rows, 180);
    assert_eq!(summary.slugs, 3);
    assert!(summary.skipped.is_empty());
    assert_eq!(summary.written.len(), 3);

    let features = store.read("tvv_features").unwrap().unwrap();
    assert_eq!(features.height(), 180);
    assert!(features.column("m_tvv_sma_9").is_some());
    assert!(features.column("m_tvv_keltner_upper").is_some());

    let signals = store.read("tvv_signals").unwrap().unwrap();
    assert!(signals.column("m_tvv_sma_9_18_sig").is_some());
    assert!(signals.column("v_tvv_vwap_sig").is_some());

    // Global latest: one row per slug on the shared last day.
    let backtest = store.read("tvv_features_backtest").unwrap().unwrap();
    assert_eq!(backtest.height(), 3);
}

#[test]
fn replace_is_idempotent_and_append_accretes() {
    let (_dir, store, cfg) = seeded_store(2);

    let first = run_family(&store, &cfg, Family::Momentum).unwrap();
    let second = run_family(&store, &cfg, Family::Momentum).unwrap();

    assert_eq!(first.written[0].content_hash, second.written[0].content_hash);
    assert_eq!(first.written[1].content_hash, second.written[1].content_hash);

    assert_eq!(first.written[2].rows, 2);
    assert_eq!(second.written[2].rows, 4);
    assert_eq!(store.read("momentum_features_backtest").unwrap().unwrap().height(), 4);
}

#[test]
fn append_schema_change_aborts_before_any_write() {
    let (_dir, store, cfg) = seeded_store(2);
    run_family(&store, &cfg, Family::Momentum).unwrap();
    let features_before = store.meta("momentum_features").unwrap().unwrap();
    let signals_before = store.meta("momentum_signals").unwrap().unwrap();

    let mut narrower = cfg.clone();
    narrower.indicators.rsi_periods = vec![9];
    let err = run_family(&store, &narrower, Family::Momentum).unwrap_err();
    assert!(
        matches!(err, RunError::AppendSchema { ref table, .. } if table == "momentum_features_backtest")
    );

    let features_after = store.meta("momentum_features").unwrap().unwrap();
    let signals_after = store.meta("momentum_signals").unwrap().unwrap();
    assert_eq!(features_before.content_hash, features_after.content_hash);
    assert_eq!(features_before.schema, features_after.schema);
    assert_eq!(signals_before.content_hash, signals_after.content_hash);
    assert_eq!(store.read("momentum_features_backtest").unwrap().unwrap().height(), 2);
}

#[test]
fn aggregate_replace_is_idempotent() {
    let (_dir, store, cfg) = seeded_store(3);
    run_all(&store, &cfg).unwrap();

    let first = run_aggregate(&store, &cfg).unwrap();
    let second = run_aggregate(&store, &cfg).unwrap();
    assert_eq!(first.written.len(), 3);
    for (a, b) in first.written.iter().zip(&second.written) {
        assert_eq!(a.table, b.table);
        assert_eq!(a.content_hash, b.content_hash, "{} changed between runs", a.table);
    }
    let tables: Vec<&str> = first.written.iter().map(|m| m.table.as_str()).collect();
    assert_eq!(tables, ["all_signals", "scores", "scores_latest"]);
}

#[test]
fn empty_input_aborts_without_writing() {
    let dir = TempDir::new().unwrap();
    let store = ParquetStore::new(dir.path());
    let cfg = RunConfig::default();

    let err = run_family(&store, &cfg, Family::PctChange).unwrap_err();
    assert!(matches!(err, RunError::EmptyInput { ref table } if table == "ohlcv"));
    assert!(store.read("pct_change_features").unwrap().is_none());
    assert!(store.read("pct_change_signals").unwrap().is_none());
}

#[test]
fn rank_limit_restricts_the_universe() {
    let dir = TempDir::new().unwrap();
    let store = ParquetStore::new(dir.path());
    let mut cfg = RunConfig::default();
    cfg.input.rank_limit = 2;
    let data = universe(4);
    ingest(&store, &cfg, &data.observations, &data.assets, WriteMode::Replace).unwrap();

    let summary = run_family(&store, &cfg, Family::PctChange).unwrap();
    assert_eq!(summary.slugs, 2);
    assert_eq!(summary.rows, 120);
}

#[test]
fn missing_listings_table_skips_the_rank_filter() {
    let dir = TempDir::new().unwrap();
    let store = ParquetStore::new(dir.path());
    let mut cfg = RunConfig::default();
    cfg.input.rank_limit = 1;
    let data = universe(3);
    ingest(&store, &cfg, &data.observations, &[], WriteMode::Replace).unwrap();

    let summary = run_family(&store, &cfg, Family::PctChange).unwrap();
    assert_eq!(summary.slugs, 3);
}

#[test]
fn aggregate_tolerates_missing_families() {
    let (_dir, store, cfg) = seeded_store(3);
    run_family(&store, &cfg, Family::Momentum).unwrap();

    let summary = run_aggregate(&store, &cfg).unwrap();
    assert_eq!(summary.missing, vec![Family::Tvv, Family::PctChange]);
    assert_eq!(summary.signal_columns, 5);

    let all = store.read("all_signals").unwrap().unwrap();
    assert!(all.column("bullish").is_some());
    assert!(all.column("m_mom_roc_sig").is_some());

    let scores = store.read("scores").unwrap().unwrap();
    assert!(scores.column(ScoreBucket::Momentum.score_column()).is_some());
    assert_eq!(scores.height(), all.height());

    let latest = store.read("scores_latest").unwrap().unwrap();
    assert_eq!(latest.height(), 3);
}

#[test]
fn aggregate_without_any_signals_is_empty_input() {
    let (_dir, store, cfg) = seeded_store(2);
    let err = run_aggregate(&store, &cfg).unwrap_err();
    assert!(matches!(err, RunError::EmptyInput { .. }));
    assert!(store.read("all_signals").unwrap().is_none());
}

#[test]
fn run_all_produces_every_table() {
    let (_dir, store, cfg) = seeded_store(3);

    let summary = run_all(&store, &cfg).unwrap();
    assert_eq!(summary.families.len(), 3);
    assert!(summary.failed.is_empty());
    assert!(summary.aggregate.missing.is_empty());
    assert_eq!(summary.aggregate.signal_columns, 16);

    let scores = store.read("scores").unwrap().unwrap();
    for bucket in ScoreBucket::ALL {
        let values = scores.floats(bucket.score_column()).unwrap();
        assert!(values.iter().any(Option::is_some), "{bucket} never scored");
    }
}

#[test]
fn run_all_fails_when_every_family_fails() {
    let dir = TempDir::new().unwrap();
    let store = ParquetStore::new(dir.path());
    let err = run_all(&store, &RunConfig::default()).unwrap_err();
    assert!(matches!(err, RunError::EmptyInput { .. }));
}
