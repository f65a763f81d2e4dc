//! ---
//! bmd_section: "02-simulation"
//! bmd_subsection: "module"
//! bmd_type: "source"
//! bmd_scope: "code"
//! bmd_description: "Threshold alarm rules evaluated per snapshot."
//! bmd_version: "v0.1.0"
//! bmd_owner: "tbd"
//! ---
use p_bmd_common::AlarmThresholds;

/// Label recorded when dissolved oxygen leaves its band.
pub const DO_OUT_OF_RANGE: &str = "DOOutOfRange";
/// Label recorded when temperature exceeds its ceiling.
pub const HIGH_TEMP: &str = "HighTemp";
/// Label recorded when pH leaves its band.
pub const PH_OUT_OF_RANGE: &str = "pHOutOfRange";

/// Separator used when persisting multiple labels in one field.
pub const LABEL_SEPARATOR: &str = ", ";

/// Outcome of evaluating every alarm rule against one snapshot.
///
/// Labels are kept in rule-declaration order: dissolved oxygen, temperature,
/// pH. That order is part of the persisted file contract.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AlarmState {
    labels: Vec<&'static str>,
}

impl AlarmState {
    /// Evaluate the three independent rules; any subset may fire.
    pub fn evaluate(thresholds: &AlarmThresholds, do_pct: f64, temp_c: f64, ph: f64) -> Self {
        let mut labels = Vec::new();
        if do_pct < thresholds.dissolved_oxygen_low || do_pct > thresholds.dissolved_oxygen_high {
            labels.push(DO_OUT_OF_RANGE);
        }
        if temp_c > thresholds.temperature_high {
            labels.push(HIGH_TEMP);
        }
        if ph < thresholds.ph_low || ph > thresholds.ph_high {
            labels.push(PH_OUT_OF_RANGE);
        }
        Self { labels }
    }

    /// True when at least one rule fired.
    pub fn triggered(&self) -> bool {
        !self.labels.is_empty()
    }

    /// Number of rules that fired.
    pub fn count(&self) -> usize {
        self.labels.len()
    }

    /// Fired labels in rule order.
    pub fn labels(&self) -> &[&'static str] {
        &self.labels
    }

    /// Comma-joined label field as persisted; empty string when clear.
    pub fn join(&self) -> String {
        self.labels.join(LABEL_SEPARATOR)
    }
}
