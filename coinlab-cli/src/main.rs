//! coinlab CLI: load raw data, run indicator families, aggregate signals.
//!
//! Commands:
//! - `import` load OHLCV and listings CSV files into the store
//! - `synthetic` seed the store with a generated universe
//! - `run` compute one family and write its tables
//! - `aggregate` join family signals and write scores
//! - `run-all` every family, then the aggregate
//! - `latest` print the latest snapshot of a stored table as CSV
//! - `show-config` print the effective configuration as TOML

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use coinlab_core::synthetic::{generate, SyntheticSpec};
use coinlab_core::{Family, LatestPolicy};
use coinlab_runner::{
    ingest, read_listings_csv, read_observations_csv, run_aggregate, run_all, run_family,
    AggregateRunSummary, FamilyRunSummary, ParquetStore, RunConfig, TableMeta, TableStore,
    WriteMode,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(
    name = "coinlab",
    about = "coinlab: crypto technical indicators, signals and scores"
)]
struct Cli {
    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// TOML run configuration. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store directory, overriding `store.root` from the configuration.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load OHLCV and listings CSV files into the input tables.
    Import {
        /// OHLCV CSV: slug, timestamp, open, high, low, close, volume, market_cap.
        #[arg(long)]
        ohlcv: Option<PathBuf>,

        /// Listings CSV: id, slug, name, symbol, rank.
        #[arg(long)]
        listings: Option<PathBuf>,

        /// Append to existing tables instead of replacing them.
        #[arg(long, default_value_t = false)]
        append: bool,
    },
    /// Generate a seeded synthetic universe into the input tables.
    Synthetic {
        #[arg(long, default_value_t = 5)]
        assets: usize,

        #[arg(long, default_value_t = 365)]
        days: usize,

        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// First day (YYYY-MM-DD). Defaults to 2023-01-01.
        #[arg(long)]
        start: Option<String>,
    },
    /// Compute one indicator family and write its tables.
    Run {
        /// momentum, tvv or pct_change.
        #[arg(long)]
        family: Family,
    },
    /// Join every family's signals and write all-signals and score tables.
    Aggregate,
    /// Run every family, then aggregate.
    RunAll,
    /// Print the latest rows of a stored table as CSV.
    Latest {
        #[arg(long)]
        table: String,

        /// Each slug's own latest row instead of the global latest timestamp.
        #[arg(long, default_value_t = false)]
        per_slug: bool,
    },
    /// Print the effective configuration as TOML.
    ShowConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RunConfig::default(),
    };
    if let Some(root) = cli.store {
        config.store.root = root;
    }
    let store = ParquetStore::new(&config.store.root);
    tracing::debug!(root = %config.store.root.display(), "using store");

    match cli.command {
        Commands::Import {
            ohlcv,
            listings,
            append,
        } => run_import(&store, &config, ohlcv, listings, append),
        Commands::Synthetic {
            assets,
            days,
            seed,
            start,
        } => run_synthetic(&store, &config, assets, days, seed, start),
        Commands::Run { family } => {
            let summary = run_family(&store, &config, family)?;
            print_family(&summary);
            Ok(())
        }
        Commands::Aggregate => {
            let summary = run_aggregate(&store, &config)?;
            print_aggregate(&summary);
            Ok(())
        }
        Commands::RunAll => {
            let summary = run_all(&store, &config)?;
            for family in &summary.families {
                print_family(family);
            }
            for family in &summary.failed {
                println!("{family}: FAILED (see log)");
            }
            print_aggregate(&summary.aggregate);
            Ok(())
        }
        Commands::Latest { table, per_slug } => run_latest(&store, &table, per_slug),
        Commands::ShowConfig => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn run_import(
    store: &ParquetStore,
    config: &RunConfig,
    ohlcv: Option<PathBuf>,
    listings: Option<PathBuf>,
    append: bool,
) -> Result<()> {
    if ohlcv.is_none() && listings.is_none() {
        bail!("nothing to import: pass --ohlcv and/or --listings");
    }
    let observations = ohlcv
        .as_deref()
        .map(read_observations_csv)
        .transpose()?
        .unwrap_or_default();
    let assets = listings
        .as_deref()
        .map(read_listings_csv)
        .transpose()?
        .unwrap_or_default();

    let mode = if append {
        WriteMode::Append
    } else {
        WriteMode::Replace
    };
    let summary = ingest(store, config, &observations, &assets, mode)?;
    for meta in summary.observations.iter().chain(&summary.listings) {
        print_meta(meta);
    }
    Ok(())
}

fn run_synthetic(
    store: &ParquetStore,
    config: &RunConfig,
    assets: usize,
    days: usize,
    seed: u64,
    start: Option<String>,
) -> Result<()> {
    if assets == 0 || days == 0 {
        bail!("--assets and --days must be at least 1");
    }
    let mut spec = SyntheticSpec {
        assets,
        days,
        seed,
        ..SyntheticSpec::default()
    };
    if let Some(start) = start.as_deref() {
        spec.start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
            .with_context(|| format!("invalid --start '{start}'"))?;
    }

    let universe = generate(&spec);
    let summary = ingest(
        store,
        config,
        &universe.observations,
        &universe.assets,
        WriteMode::Replace,
    )?;
    for meta in summary.observations.iter().chain(&summary.listings) {
        print_meta(meta);
    }
    Ok(())
}

fn run_latest(store: &ParquetStore, table: &str, per_slug: bool) -> Result<()> {
    let Some(data) = store.read(table)? else {
        bail!("table '{table}' does not exist in {}", store.root().display());
    };
    let policy = if per_slug {
        LatestPolicy::PerSlug
    } else {
        LatestPolicy::Global
    };
    let latest = data.select_latest(policy)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&latest.canonical_csv()?)?;
    stdout.flush()?;
    Ok(())
}

fn print_meta(meta: &TableMeta) {
    println!(
        "{:<28} {:>8} rows  {:?}  {}",
        meta.table,
        meta.rows,
        meta.mode,
        &meta.content_hash[..12.min(meta.content_hash.len())]
    );
}

fn print_family(summary: &FamilyRunSummary) {
    println!(
        "{}: {} rows, {} slugs, {} signals",
        summary.family, summary.rows, summary.slugs, summary.signals
    );
    if !summary.skipped.is_empty() {
        println!("  skipped: {}", summary.skipped.join(", "));
    }
    for meta in &summary.written {
        print!("  ");
        print_meta(meta);
    }
}

fn print_aggregate(summary: &AggregateRunSummary) {
    println!(
        "aggregate: {} rows, {} signal columns",
        summary.rows, summary.signal_columns
    );
    if !summary.missing.is_empty() {
        let missing: Vec<String> = summary.missing.iter().map(Family::to_string).collect();
        println!("  missing families: {}", missing.join(", "));
    }
    for meta in &summary.written {
        print!("  ");
        print_meta(meta);
    }
}
