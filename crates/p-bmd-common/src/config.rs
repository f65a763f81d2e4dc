//! ---
//! bmd_section: "01-core-functionality"
//! bmd_subsection: "module"
//! bmd_type: "source"
//! bmd_scope: "code"
//! bmd_description: "Shared primitives for the batch monitoring workspace."
//! bmd_version: "v0.1.0"
//! bmd_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::logging::LogFormat;

fn default_data_path() -> PathBuf {
    PathBuf::from("data/batch_data.csv")
}

fn default_batch_count() -> u32 {
    60
}

fn default_wipe() -> bool {
    true
}

fn default_batch_interval_hours() -> i64 {
    24
}

fn default_do_low() -> f64 {
    20.0
}

fn default_do_high() -> f64 {
    50.0
}

fn default_temperature_high() -> f64 {
    40.0
}

fn default_ph_low() -> f64 {
    6.5
}

fn default_ph_high() -> f64 {
    7.5
}

fn default_do_range() -> (f64, f64) {
    (18.0, 52.0)
}

fn default_temperature_range() -> (f64, f64) {
    (30.0, 42.0)
}

fn default_ph_range() -> (f64, f64) {
    (6.4, 7.6)
}

fn default_base_yield_range() -> (f64, f64) {
    (3.6, 3.8)
}

fn default_alarm_penalty_range() -> (f64, f64) {
    (1.0, 2.0)
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

/// Primary configuration object for the P-BMD tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Generator and store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Persisted batch history the generator appends to.
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    /// Number of snapshots produced per run.
    #[serde(default = "default_batch_count")]
    pub batch_count: u32,
    /// Wipe the history and restart at BatchID 1 before generating.
    #[serde(default = "default_wipe")]
    pub wipe: bool,
    /// Simulated spacing between consecutive batches.
    #[serde(default = "default_batch_interval_hours")]
    pub batch_interval_hours: i64,
    /// Fixed rng seed; omitted means a fresh seed per run.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub thresholds: AlarmThresholds,
    #[serde(default)]
    pub ranges: ProcessRanges,
}

/// Alarm rule thresholds applied to every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlarmThresholds {
    #[serde(default = "default_do_low")]
    pub dissolved_oxygen_low: f64,
    #[serde(default = "default_do_high")]
    pub dissolved_oxygen_high: f64,
    #[serde(default = "default_temperature_high")]
    pub temperature_high: f64,
    #[serde(default = "default_ph_low")]
    pub ph_low: f64,
    #[serde(default = "default_ph_high")]
    pub ph_high: f64,
}

/// Uniform sampling bounds for the synthetic process variables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessRanges {
    /// Dissolved oxygen, percent saturation.
    #[serde(default = "default_do_range")]
    pub dissolved_oxygen: (f64, f64),
    /// Broth temperature, degrees Celsius.
    #[serde(default = "default_temperature_range")]
    pub temperature: (f64, f64),
    #[serde(default = "default_ph_range")]
    pub ph: (f64, f64),
    /// Alarm-free yield, grams.
    #[serde(default = "default_base_yield_range")]
    pub base_yield: (f64, f64),
    /// Yield penalty applied once per fired alarm, grams.
    #[serde(default = "default_alarm_penalty_range")]
    pub alarm_penalty: (f64, f64),
}

/// Logging sink settings consumed by [`crate::logging::init_tracing`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    /// Optional prefix for rolling log files; defaults to the service name.
    #[serde(default)]
    pub file_prefix: Option<String>,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

impl AppConfig {
    /// Environment variable overriding the candidate search paths.
    pub const ENV_CONFIG_PATH: &'static str = "P_BMD_CONFIG";

    /// Load configuration from disk, respecting the `P_BMD_CONFIG` override.
    ///
    /// When the override is unset and none of the candidates exist, the
    /// built-in defaults are returned rather than an error; these tools must
    /// run out of the box with no config file present.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                return Self::from_path(PathBuf::from(env_path));
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                return Self::from_path(candidate.as_ref().to_path_buf());
            }
        }

        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()
    }
}

impl SimulationConfig {
    /// Validate sampling bounds and threshold ordering.
    pub fn validate(&self) -> Result<()> {
        if self.batch_interval_hours <= 0 {
            return Err(anyhow!("batch_interval_hours must be positive"));
        }
        self.ranges.validate()?;
        self.thresholds.validate()
    }
}

impl AlarmThresholds {
    fn validate(&self) -> Result<()> {
        if self.dissolved_oxygen_low >= self.dissolved_oxygen_high {
            return Err(anyhow!(
                "dissolved oxygen thresholds must satisfy low < high"
            ));
        }
        if self.ph_low >= self.ph_high {
            return Err(anyhow!("pH thresholds must satisfy low < high"));
        }
        Ok(())
    }
}

impl ProcessRanges {
    fn validate(&self) -> Result<()> {
        for (name, (low, high)) in [
            ("dissolved_oxygen", self.dissolved_oxygen),
            ("temperature", self.temperature),
            ("ph", self.ph),
            ("base_yield", self.base_yield),
            ("alarm_penalty", self.alarm_penalty),
        ] {
            if low >= high {
                return Err(anyhow!("sampling range {name} must satisfy low < high"));
            }
        }
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            batch_count: default_batch_count(),
            wipe: default_wipe(),
            batch_interval_hours: default_batch_interval_hours(),
            seed: None,
            thresholds: AlarmThresholds::default(),
            ranges: ProcessRanges::default(),
        }
    }
}

impl Default for AlarmThresholds {
    fn default() -> Self {
        Self {
            dissolved_oxygen_low: default_do_low(),
            dissolved_oxygen_high: default_do_high(),
            temperature_high: default_temperature_high(),
            ph_low: default_ph_low(),
            ph_high: default_ph_high(),
        }
    }
}

impl Default for ProcessRanges {
    fn default() -> Self {
        Self {
            dissolved_oxygen: default_do_range(),
            temperature: default_temperature_range(),
            ph: default_ph_range(),
            base_yield: default_base_yield_range(),
            alarm_penalty: default_alarm_penalty_range(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            file_prefix: None,
            format: default_log_format(),
        }
    }
}
