//! ---
//! bmd_section: "03-storage"
//! bmd_subsection: "module"
//! bmd_type: "source"
//! bmd_scope: "code"
//! bmd_description: "CSV history store abstractions and bindings."
//! bmd_version: "v0.1.0"
//! bmd_owner: "tbd"
//! ---
#![warn(missing_docs)]

//! Append-only CSV history for batch snapshots: file lifecycle, continuation
//! state derived from the tail row, and lenient full-file loads for
//! downstream consumers.

/// Result alias used throughout the store crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Error type for the history store.
///
/// Appends surface their failures through this type instead of being
/// swallowed; callers decide whether a lost row aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Wrapper for IO errors encountered while touching the history file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Wrapper for CSV serialization and parsing failures.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// History file lifecycle and continuation state.
pub mod history;

pub use history::{BatchHistory, ContinuationState, CSV_HEADER};
