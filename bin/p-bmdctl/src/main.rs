//! ---
//! bmd_section: "05-command-line"
//! bmd_subsection: "binary"
//! bmd_type: "source"
//! bmd_scope: "code"
//! bmd_description: "Reporting CLI over persisted batch histories."
//! bmd_version: "v0.1.0"
//! bmd_owner: "tbd"
//! ---
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use p_bmd_common::AppConfig;
use p_bmd_report::{alarm_breakdown, yield_trend, KpiSummary, DEFAULT_TREND_WINDOW};
use p_bmd_sim::BatchSnapshot;
use p_bmd_store::BatchHistory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Inspect a generated pharma batch history",
    long_about = None
)]
struct Cli {
    /// History file to read (defaults to the configured data path)
    #[arg(long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Output rendering
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Path to a configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// KPI card numbers: batch count, alarmed count, mean yield
    Summary,
    /// Yield trend with a trailing moving average, ordered by timestamp
    Trend {
        /// Trailing window size in rows
        #[arg(long, default_value_t = DEFAULT_TREND_WINDOW)]
        window: usize,
    },
    /// Alarm label breakdown across all alarmed batches
    Alarms,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let mut simulation = config.simulation;
    if let Some(data) = &cli.data {
        simulation.data_path = data.clone();
    }
    let history = BatchHistory::from_config(&simulation);
    let rows = load_rows(&history)?;

    let output = match cli.command {
        Commands::Summary => render_summary(&rows, cli.format)?,
        Commands::Trend { window } => render_trend(&rows, window, cli.format)?,
        Commands::Alarms => render_alarms(&rows, cli.format)?,
    };
    println!("{output}");
    Ok(())
}

/// Diagnostics go to stderr so text output stays pipeable.
fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .ok();
}

/// A history that has not been generated yet is "no history", not an error;
/// every view renders its empty shape instead.
fn load_rows(history: &BatchHistory) -> Result<Vec<BatchSnapshot>> {
    if !history.path().exists() {
        warn!(path = %history.path().display(), "history file does not exist yet; treating as empty");
        return Ok(Vec::new());
    }
    history
        .load()
        .with_context(|| format!("failed to read history {}", history.path().display()))
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

fn render_summary(rows: &[BatchSnapshot], format: OutputFormat) -> Result<String> {
    let summary = KpiSummary::from_snapshots(rows);
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => {
            let mut out = String::new();
            writeln!(out, "batches:    {}", summary.batches)?;
            writeln!(
                out,
                "alarmed:    {} ({:.1}%)",
                summary.alarmed,
                summary.alarm_rate * 100.0
            )?;
            write!(out, "mean yield: {:.2} g", summary.mean_yield)?;
            Ok(out)
        }
    }
}

fn render_trend(rows: &[BatchSnapshot], window: usize, format: OutputFormat) -> Result<String> {
    let trend = yield_trend(rows, window);
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&trend)?),
        OutputFormat::Text => {
            if trend.is_empty() {
                return Ok("no batches recorded".to_owned());
            }
            let mut out = String::new();
            for point in &trend {
                writeln!(
                    out,
                    "{}  batch {:>5}  yield {:>5.2}  avg {:>5.2}",
                    point.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    point.batch_id,
                    point.product_yield,
                    point.moving_average
                )?;
            }
            out.pop();
            Ok(out)
        }
    }
}

fn render_alarms(rows: &[BatchSnapshot], format: OutputFormat) -> Result<String> {
    let tally = alarm_breakdown(rows);
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&tally)?),
        OutputFormat::Text => {
            if tally.is_empty() {
                return Ok("no alarms recorded".to_owned());
            }
            let mut out = String::new();
            for (label, count) in &tally {
                writeln!(out, "{label:<16} {count}")?;
            }
            out.pop();
            Ok(out)
        }
    }
}
