//! ---
//! bmd_section: "06-testing"
//! bmd_subsection: "integration"
//! bmd_type: "source"
//! bmd_scope: "test"
//! bmd_description: "End-to-end generator loop and aggregation checks."
//! bmd_version: "v0.1.0"
//! bmd_owner: "tbd"
//! ---
//! Drives the generate/append loop the way `p-bmd-simgen` does and checks the
//! persisted history end to end.

use std::fs;
use std::path::Path;

use chrono::Duration;
use p_bmd_common::SimulationConfig;
use p_bmd_report::{alarm_breakdown, yield_trend, KpiSummary};
use p_bmd_sim::SnapshotEngine;
use p_bmd_store::{BatchHistory, CSV_HEADER};
use tempfile::tempdir;

fn config_for(path: &Path, seed: u64) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.data_path = path.to_path_buf();
    config.seed = Some(seed);
    config
}

/// The driver loop: initialize, derive continuation once, generate and append.
fn run_loop(config: &SimulationConfig, batches: u32, wipe: bool) {
    let history = BatchHistory::from_config(config);
    history.initialize(wipe).unwrap();
    let mut engine = SnapshotEngine::new(config, config.seed.unwrap());
    let mut state = history.continuation();
    for _ in 0..batches {
        let snapshot = engine.next_snapshot(state.next_batch_id, state.next_timestamp);
        history.append(&snapshot).unwrap();
        state.advance(history.interval());
    }
}

#[test]
fn fresh_run_yields_contiguous_ids_and_spaced_timestamps() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("batch_data.csv");
    let config = config_for(&path, 11);
    run_loop(&config, 10, true);

    let rows = BatchHistory::from_config(&config).load().unwrap();
    assert_eq!(rows.len(), 10);
    for (index, row) in rows.iter().enumerate() {
        assert_eq!(row.batch_id, index as u64 + 1);
    }
    for pair in rows.windows(2) {
        assert_eq!(pair[1].timestamp - pair[0].timestamp, Duration::hours(24));
    }
}

#[test]
fn continuation_run_extends_without_gaps() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("batch_data.csv");
    let config = config_for(&path, 23);
    run_loop(&config, 6, true);
    run_loop(&config, 4, false);

    let rows = BatchHistory::from_config(&config).load().unwrap();
    assert_eq!(rows.len(), 10);
    let ids: Vec<_> = rows.iter().map(|row| row.batch_id).collect();
    assert_eq!(ids, (1..=10).collect::<Vec<u64>>());
    // The second run keeps the 24h cadence across the boundary.
    assert_eq!(rows[6].timestamp - rows[5].timestamp, Duration::hours(24));
}

#[test]
fn wipe_restarts_at_batch_one() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("batch_data.csv");
    let config = config_for(&path, 5);
    run_loop(&config, 6, true);
    run_loop(&config, 3, true);

    let rows = BatchHistory::from_config(&config).load().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].batch_id, 1);
}

#[test]
fn generated_file_starts_with_contract_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("batch_data.csv");
    let config = config_for(&path, 3);
    run_loop(&config, 2, true);

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().next().unwrap(), CSV_HEADER);
}

#[test]
fn initialize_without_wipe_is_byte_stable() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("batch_data.csv");
    let config = config_for(&path, 17);
    run_loop(&config, 5, true);

    let before = fs::read(&path).unwrap();
    BatchHistory::from_config(&config).initialize(false).unwrap();
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn generated_rows_hold_the_snapshot_invariants() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("batch_data.csv");
    let config = config_for(&path, 31);
    run_loop(&config, 200, true);

    let rows = BatchHistory::from_config(&config).load().unwrap();
    for row in &rows {
        assert!(row.product_yield >= 0.0);
        assert!(row.is_consistent(), "batch {}", row.batch_id);
    }
}

#[test]
fn aggregates_match_generated_history() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("batch_data.csv");
    let config = config_for(&path, 47);
    run_loop(&config, 60, true);

    let rows = BatchHistory::from_config(&config).load().unwrap();
    let summary = KpiSummary::from_snapshots(&rows);
    assert_eq!(summary.batches, 60);
    assert_eq!(
        summary.alarmed,
        rows.iter().filter(|row| row.alarm_triggered).count() as u64
    );

    let trend = yield_trend(&rows, 7);
    assert_eq!(trend.len(), 60);
    for pair in trend.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }

    let known = ["DOOutOfRange", "HighTemp", "pHOutOfRange"];
    for label in alarm_breakdown(&rows).keys() {
        assert!(known.contains(&label.as_str()), "unexpected label {label}");
    }
}
