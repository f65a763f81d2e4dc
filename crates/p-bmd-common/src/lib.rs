//! ---
//! bmd_section: "01-core-functionality"
//! bmd_subsection: "module"
//! bmd_type: "source"
//! bmd_scope: "code"
//! bmd_description: "Shared primitives for the batch monitoring workspace."
//! bmd_version: "v0.1.0"
//! bmd_owner: "tbd"
//! ---
//! Core shared primitives for the P-BMD workspace.
//! This crate exposes configuration loading, tracing bootstrap, and
//! simulation clock utilities consumed across the workspace.

pub mod clock;
pub mod config;
pub mod logging;

pub use clock::{batch_interval, simulation_epoch, TIMESTAMP_FORMAT};
pub use config::{AlarmThresholds, AppConfig, LoggingConfig, ProcessRanges, SimulationConfig};
pub use logging::{init_tracing, LogFormat};
