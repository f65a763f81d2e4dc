//! ---
//! bmd_section: "05-command-line"
//! bmd_subsection: "binary"
//! bmd_type: "source"
//! bmd_scope: "code"
//! bmd_description: "Binary entrypoint for the batch history generator."
//! bmd_version: "v0.1.0"
//! bmd_owner: "tbd"
//! ---
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::Rng;
use tracing::info;

use p_bmd_common::{init_tracing, AppConfig, SimulationConfig};
use p_bmd_sim::SnapshotEngine;
use p_bmd_store::BatchHistory;

const SERVICE_NAME: &str = "p-bmd-simgen";

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Generate a synthetic pharma batch history",
    long_about = None
)]
struct Cli {
    /// Number of batch snapshots to generate
    #[arg(long)]
    batches: Option<u32>,

    /// Keep the existing history and continue from its last row
    /// (default behaviour wipes the file and restarts at BatchID 1)
    #[arg(long)]
    keep_history: bool,

    /// Output history file
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Fixed rng seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated hours between consecutive batches
    #[arg(long)]
    interval_hours: Option<i64>,

    /// Path to a configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    apply_overrides(&mut config.simulation, &cli);
    config.validate()?;
    init_tracing(SERVICE_NAME, &config.logging)?;
    run(&config.simulation)
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(path) => {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            AppConfig::load(&[path])
        }
        None => AppConfig::load(&[Path::new("p-bmd.toml"), Path::new("configs/p-bmd.toml")]),
    }
}

fn apply_overrides(config: &mut SimulationConfig, cli: &Cli) {
    if let Some(batches) = cli.batches {
        config.batch_count = batches;
    }
    if cli.keep_history {
        config.wipe = false;
    }
    if let Some(output) = &cli.output {
        config.data_path = output.clone();
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if let Some(hours) = cli.interval_hours {
        config.batch_interval_hours = hours;
    }
}

fn run(config: &SimulationConfig) -> Result<()> {
    let history = BatchHistory::from_config(config);
    history
        .initialize(config.wipe)
        .with_context(|| format!("failed to initialize history {}", history.path().display()))?;

    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut engine = SnapshotEngine::new(config, seed);

    // Continuation is derived once and advanced in memory; the run assumes
    // no other writer touches the file while it is in progress.
    let mut state = history.continuation();
    let first_batch_id = state.next_batch_id;

    for _ in 0..config.batch_count {
        let snapshot = engine.next_snapshot(state.next_batch_id, state.next_timestamp);
        history.append(&snapshot).with_context(|| {
            format!(
                "failed to append batch {} to {}",
                snapshot.batch_id,
                history.path().display()
            )
        })?;
        state.advance(history.interval());
    }

    info!(
        batches = config.batch_count,
        first_batch_id,
        seed,
        path = %history.path().display(),
        wiped = config.wipe,
        "batch history generated"
    );
    Ok(())
}
