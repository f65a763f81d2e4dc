//! ---
//! bmd_section: "02-simulation"
//! bmd_subsection: "module"
//! bmd_type: "source"
//! bmd_scope: "code"
//! bmd_description: "Snapshot engine sampling process variables and yield."
//! bmd_version: "v0.1.0"
//! bmd_owner: "tbd"
//! ---
use chrono::NaiveDateTime;
use rand::prelude::*;
use tracing::debug;

use p_bmd_common::{AlarmThresholds, ProcessRanges, SimulationConfig};

use crate::alarms::AlarmState;
use crate::snapshot::BatchSnapshot;

/// Produces one fully-populated snapshot per batch.
///
/// The engine owns a seeded rng so runs are reproducible when the caller
/// pins a seed; everything else is a pure function of the inputs.
#[derive(Debug)]
pub struct SnapshotEngine {
    rng: StdRng,
    thresholds: AlarmThresholds,
    ranges: ProcessRanges,
}

impl SnapshotEngine {
    pub fn new(config: &SimulationConfig, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            thresholds: config.thresholds,
            ranges: config.ranges,
        }
    }

    /// Generate the snapshot for one batch.
    ///
    /// Process variables are rounded to their persisted precision before the
    /// alarm rules run, so the flags always agree with the stored values.
    pub fn next_snapshot(&mut self, batch_id: u64, timestamp: NaiveDateTime) -> BatchSnapshot {
        let dissolved_oxygen = round_to(self.sample(self.ranges.dissolved_oxygen), 1);
        let temperature = round_to(self.sample(self.ranges.temperature), 1);
        let ph = round_to(self.sample(self.ranges.ph), 2);

        let alarms = AlarmState::evaluate(&self.thresholds, dissolved_oxygen, temperature, ph);
        let product_yield = self.derive_yield(&alarms);
        if alarms.triggered() {
            debug!(batch_id, alarms = %alarms.join(), "alarm rules fired");
        }

        BatchSnapshot {
            timestamp,
            batch_id,
            dissolved_oxygen,
            temperature,
            ph,
            product_yield,
            alarm_triggered: alarms.triggered(),
            alarm_types: alarms.join(),
        }
    }

    /// Base yield degraded by one penalty draw per fired alarm, floored at 0.
    fn derive_yield(&mut self, alarms: &AlarmState) -> f64 {
        let base = self.sample(self.ranges.base_yield);
        let penalty = self.sample(self.ranges.alarm_penalty) * alarms.count() as f64;
        round_to((base - penalty).max(0.0), 2)
    }

    fn sample(&mut self, (low, high): (f64, f64)) -> f64 {
        self.rng.gen_range(low..high)
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
