//! ---
//! bmd_section: "03-storage"
//! bmd_subsection: "module"
//! bmd_type: "source"
//! bmd_scope: "code"
//! bmd_description: "Batch history file lifecycle and continuation state."
//! bmd_version: "v0.1.0"
//! bmd_owner: "tbd"
//! ---
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime};
use tracing::warn;

use p_bmd_common::clock::parse_timestamp;
use p_bmd_common::{batch_interval, simulation_epoch, SimulationConfig};
use p_bmd_sim::BatchSnapshot;

use crate::Result;

/// Fixed header line of every history file. Part of the file contract.
pub const CSV_HEADER: &str =
    "Timestamp,BatchID,DissolvedOxygen,Temperature,pH,Yield,AlarmTriggered,AlarmType(s)";

const BATCH_ID_COLUMN: &str = "BatchID";
const TIMESTAMP_COLUMN: &str = "Timestamp";

/// Identity and timestamp of the next batch to generate.
///
/// Derived once from the tail of the history and advanced in memory by the
/// driver. A concurrent external writer appending to the same file can
/// produce duplicate or out-of-order BatchIDs; the single-user demo accepts
/// that in exchange for one tail read per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuationState {
    /// BatchID the next snapshot will carry.
    pub next_batch_id: u64,
    /// Timestamp the next snapshot will carry.
    pub next_timestamp: NaiveDateTime,
}

impl ContinuationState {
    /// Step to the following batch.
    pub fn advance(&mut self, interval: Duration) {
        self.next_batch_id += 1;
        self.next_timestamp += interval;
    }
}

/// Handle on one history file plus the continuation defaults for it.
#[derive(Debug, Clone)]
pub struct BatchHistory {
    path: PathBuf,
    epoch: NaiveDateTime,
    interval: Duration,
}

impl BatchHistory {
    /// Construct a handle with explicit continuation defaults.
    pub fn new(path: impl Into<PathBuf>, epoch: NaiveDateTime, interval: Duration) -> Self {
        Self {
            path: path.into(),
            epoch,
            interval,
        }
    }

    /// Construct a handle from simulation settings, using the standard epoch.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            config.data_path.clone(),
            simulation_epoch(),
            batch_interval(config.batch_interval_hours),
        )
    }

    /// Location of the history file on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Spacing applied between consecutive batches.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ensure the file exists with the contract header.
    ///
    /// Wiping (or a missing file) truncates and rewrites the header line.
    /// An existing file is otherwise left byte-for-byte untouched, even when
    /// its content is malformed.
    pub fn initialize(&self, wipe: bool) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if wipe || !self.path.exists() {
            let mut file = File::create(&self.path)?;
            file.write_all(CSV_HEADER.as_bytes())?;
            file.write_all(b"\n")?;
            file.flush()?;
        }
        Ok(())
    }

    /// Derive the next batch identity from the last persisted row.
    ///
    /// Only the tail row is consulted; the history is assumed append-only and
    /// time-ordered. A missing, empty, or unreadable file, and a header
    /// lacking the expected column, all degrade per field to the defaults
    /// `{1, epoch}` rather than failing.
    pub fn continuation(&self) -> ContinuationState {
        let (last_id, last_timestamp) = self.tail_state();
        ContinuationState {
            next_batch_id: last_id.map_or(1, |id| id + 1),
            next_timestamp: last_timestamp.map_or(self.epoch, |ts| ts + self.interval),
        }
    }

    /// Append one snapshot row without rewriting the header.
    pub fn append(&self, snapshot: &BatchSnapshot) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(snapshot)?;
        writer.flush()?;
        Ok(())
    }

    /// Read the entire history for downstream aggregation.
    ///
    /// Rows that fail to parse are skipped with a warning so one corrupt line
    /// does not take the dashboard down with it.
    pub fn load(&self) -> Result<Vec<BatchSnapshot>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;
        let mut rows = Vec::new();
        for (index, record) in reader.deserialize::<BatchSnapshot>().enumerate() {
            match record {
                Ok(snapshot) => rows.push(snapshot),
                Err(err) => {
                    // +2: one for the header line, one for 1-based numbering.
                    warn!(line = index + 2, error = %err, "skipping unreadable history row");
                }
            }
        }
        Ok(rows)
    }

    fn tail_state(&self) -> (Option<u64>, Option<NaiveDateTime>) {
        let Ok(mut reader) = csv::ReaderBuilder::new().flexible(true).from_path(&self.path)
        else {
            return (None, None);
        };
        let headers = match reader.headers() {
            Ok(headers) => headers.clone(),
            Err(_) => return (None, None),
        };
        let id_column = headers.iter().position(|name| name == BATCH_ID_COLUMN);
        let timestamp_column = headers.iter().position(|name| name == TIMESTAMP_COLUMN);

        let mut last = None;
        for record in reader.records().flatten() {
            last = Some(record);
        }
        let Some(record) = last else {
            return (None, None);
        };

        let last_id = id_column
            .and_then(|column| record.get(column))
            .and_then(|value| value.trim().parse::<u64>().ok());
        let last_timestamp = timestamp_column
            .and_then(|column| record.get(column))
            .and_then(|value| parse_timestamp(value).ok());
        (last_id, last_timestamp)
    }
}
