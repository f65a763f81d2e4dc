//! ---
//! bmd_section: "02-simulation"
//! bmd_subsection: "01-bootstrap"
//! bmd_type: "source"
//! bmd_scope: "code"
//! bmd_description: "Snapshot generator module exports and shared types."
//! bmd_version: "v0.1.0"
//! bmd_owner: "tbd"
//! ---
//! Synthetic batch snapshot generation for the P-BMD workspace.
//!
//! One snapshot per simulated batch: three uniformly sampled process
//! variables, threshold alarms, and a yield degraded by fired alarms.

pub mod alarms;
pub mod generator;
pub mod snapshot;

pub use alarms::{AlarmState, DO_OUT_OF_RANGE, HIGH_TEMP, PH_OUT_OF_RANGE};
pub use generator::SnapshotEngine;
pub use snapshot::BatchSnapshot;
