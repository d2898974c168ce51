use std::path::PathBuf;

use agent_trends::{
    config::{Backend, Config},
    engine::tracker::DeltaEngine,
    generate::{RosterGenerator, dates_after, default_plan},
    persist::{SnapshotStore, fs::DirSnapshotStore, sqlite::SqliteSnapshotStore},
    types::{SnapshotDate, parse_snapshot_date},
};
use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Track day-over-day agent roster changes")]
struct Cli {
    /// TOML config file.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Overrides `store.data_dir`.
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Overrides `store.backend` ("dir" or "sqlite").
    #[arg(long, global = true)]
    backend: Option<Backend>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Store a roster file for a date, then compute that day's delta.
    Ingest {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
        /// Defaults to today.
        #[arg(long, value_parser = parse_date)]
        date: Option<SnapshotDate>,
    },
    /// Compare the two newest rosters and rebuild the series.
    Compute {
        /// Recompute every stored date, not just the newest.
        #[arg(long)]
        recompute_all: bool,
    },
    /// Compare two explicit dates.
    Compare {
        #[arg(long, value_parser = parse_date)]
        current: SnapshotDate,
        #[arg(long, value_parser = parse_date)]
        previous: Option<SnapshotDate>,
    },
    /// Print the statistics series.
    Series {
        #[arg(long)]
        json: bool,
    },
    /// Write synthetic rosters derived from a source roster.
    Generate {
        #[arg(long, value_name = "FILE")]
        source: PathBuf,
        /// First generated date; defaults to today.
        #[arg(long, value_parser = parse_date)]
        start: Option<SnapshotDate>,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Allow writing into a store that already has rosters. Generated
        /// dates are overwritten; rosters dated after them are refused.
        #[arg(long)]
        force: bool,
    },
}

fn parse_date(s: &str) -> Result<SnapshotDate, String> {
    parse_snapshot_date(s).ok_or_else(|| format!("expected YYYY-MM-DD, got {s:?}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut cfg = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        cfg.store.data_dir = dir;
    }
    if let Some(backend) = cli.backend {
        cfg.store.backend = backend;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    match cfg.store.backend {
        Backend::Dir => {
            let store = DirSnapshotStore::open(&cfg.store.data_dir)?;
            run(store, &cfg, cli.cmd)
        }
        Backend::Sqlite => {
            std::fs::create_dir_all(&cfg.store.data_dir)
                .with_context(|| format!("creating {}", cfg.store.data_dir.display()))?;
            let store = SqliteSnapshotStore::open(cfg.store.resolved_sqlite_path())?;
            run(store, &cfg, cli.cmd)
        }
    }
}

fn run<S: SnapshotStore>(store: S, cfg: &Config, cmd: Cmd) -> Result<()> {
    let mut engine = DeltaEngine::new(store);
    let today = || Local::now().date_naive();

    match cmd {
        Cmd::Ingest { file, date } => {
            let date = date.unwrap_or_else(today);
            let roster = cfg
                .ingest
                .decoder()
                .load_roster(&file, date)
                .with_context(|| format!("ingesting {}", file.display()))?;
            engine.store_mut().write_roster(&roster)?;
            info!(date = %date, agents = roster.len(), "roster stored");

            let series = engine.compute_latest(false)?;
            println!("{series}");
        }
        Cmd::Compute { recompute_all } => {
            let series = engine.compute_latest(recompute_all)?;
            println!("{series}");
        }
        Cmd::Compare { current, previous } => {
            let delta = engine.compare(current, previous)?;
            engine.store_mut().append_series()?;
            println!(
                "{}: total {} new {} unlinked {}",
                delta.date, delta.total_agents, delta.new_agents, delta.unlinked_agents
            );
            for rec in &delta.new_records {
                println!("+ {}", rec.id);
            }
            for rec in &delta.unlinked_records {
                println!("- {}", rec.id);
            }
        }
        Cmd::Series { json } => {
            let series = engine.series()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&series)?);
            } else {
                println!("{series}");
            }
        }
        Cmd::Generate {
            source,
            start,
            seed,
            force,
        } => {
            let stored = engine.store().list_available_dates()?;
            if !force && !stored.is_empty() {
                bail!("store already holds rosters; pass --force to overwrite");
            }
            let start = start.unwrap_or_else(today);
            let seed_roster = cfg
                .ingest
                .decoder()
                .load_roster(&source, start)
                .with_context(|| format!("reading source roster {}", source.display()))?;

            let rosters = RosterGenerator::seeded(seed).generate(seed_roster, &default_plan())?;
            let later = dates_after(&stored, &rosters);
            if let Some(first) = later.first() {
                bail!(
                    "store holds {} roster(s) dated after the generated range, \
                     starting at {first}; remove them or pick a later --start",
                    later.len()
                );
            }
            for roster in &rosters {
                engine.store_mut().write_roster(roster)?;
            }
            info!(days = rosters.len(), "generated rosters");

            let series = engine.compute_latest(true)?;
            println!("{series}");
        }
    }

    Ok(())
}
