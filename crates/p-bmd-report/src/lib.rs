//! ---
//! bmd_section: "04-reporting"
//! bmd_subsection: "module"
//! bmd_type: "source"
//! bmd_scope: "code"
//! bmd_description: "Aggregations backing the dashboard views."
//! bmd_version: "v0.1.0"
//! bmd_owner: "tbd"
//! ---
//! Downstream aggregation over a loaded batch history: KPI cards, the yield
//! trend line, and the alarm breakdown. Pure functions over snapshot slices;
//! file access lives in `p-bmd-store`.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use p_bmd_common::clock::serde_timestamp;
use p_bmd_sim::BatchSnapshot;
use serde::Serialize;

/// Trailing window used by the dashboard's yield trend chart.
pub const DEFAULT_TREND_WINDOW: usize = 7;

/// Headline numbers for the KPI cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSummary {
    pub batches: u64,
    pub alarmed: u64,
    pub alarm_rate: f64,
    pub mean_yield: f64,
}

impl KpiSummary {
    /// Aggregate the full history; an empty history yields all zeroes.
    pub fn from_snapshots(snapshots: &[BatchSnapshot]) -> Self {
        let batches = snapshots.len() as u64;
        let alarmed = snapshots
            .iter()
            .filter(|snapshot| snapshot.alarm_triggered)
            .count() as u64;
        let mean_yield = if snapshots.is_empty() {
            0.0
        } else {
            snapshots
                .iter()
                .map(|snapshot| snapshot.product_yield)
                .sum::<f64>()
                / batches as f64
        };
        let alarm_rate = if batches == 0 {
            0.0
        } else {
            alarmed as f64 / batches as f64
        };
        Self {
            batches,
            alarmed,
            alarm_rate,
            mean_yield,
        }
    }
}

/// One point on the yield trend line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    #[serde(with = "serde_timestamp")]
    pub timestamp: NaiveDateTime,
    pub batch_id: u64,
    pub product_yield: f64,
    /// Trailing moving average over the configured window; early points
    /// average whatever prefix is available.
    pub moving_average: f64,
}

/// Trailing moving average of yield, ordered by timestamp.
pub fn yield_trend(snapshots: &[BatchSnapshot], window: usize) -> Vec<TrendPoint> {
    let window = window.max(1);
    let mut ordered: Vec<&BatchSnapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|snapshot| snapshot.timestamp);

    let mut points = Vec::with_capacity(ordered.len());
    for (index, snapshot) in ordered.iter().enumerate() {
        let start = (index + 1).saturating_sub(window);
        let tail = &ordered[start..=index];
        let moving_average =
            tail.iter().map(|s| s.product_yield).sum::<f64>() / tail.len() as f64;
        points.push(TrendPoint {
            timestamp: snapshot.timestamp,
            batch_id: snapshot.batch_id,
            product_yield: snapshot.product_yield,
            moving_average,
        });
    }
    points
}

/// Tally of fired alarm labels across the history, first-seen order.
pub fn alarm_breakdown(snapshots: &[BatchSnapshot]) -> IndexMap<String, u64> {
    let mut tally = IndexMap::new();
    for snapshot in snapshots.iter().filter(|s| s.alarm_triggered) {
        for label in snapshot.alarm_labels() {
            *tally.entry(label.to_owned()).or_insert(0) += 1;
        }
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn snapshot(batch_id: u64, product_yield: f64, alarm_types: &str) -> BatchSnapshot {
        let epoch = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        BatchSnapshot {
            timestamp: epoch + Duration::hours(24 * batch_id as i64),
            batch_id,
            dissolved_oxygen: 30.0,
            temperature: 37.0,
            ph: 7.0,
            product_yield,
            alarm_triggered: !alarm_types.is_empty(),
            alarm_types: alarm_types.to_owned(),
        }
    }

    #[test]
    fn summary_counts_rows_and_alarms() {
        let rows = vec![
            snapshot(1, 3.7, ""),
            snapshot(2, 1.5, "HighTemp"),
            snapshot(3, 0.0, "DOOutOfRange, HighTemp"),
            snapshot(4, 3.6, ""),
        ];
        let summary = KpiSummary::from_snapshots(&rows);
        assert_eq!(summary.batches, 4);
        assert_eq!(summary.alarmed, 2);
        assert!((summary.alarm_rate - 0.5).abs() < 1e-9);
        assert!((summary.mean_yield - 2.2).abs() < 1e-9);
    }

    #[test]
    fn summary_of_empty_history_is_zeroed() {
        let summary = KpiSummary::from_snapshots(&[]);
        assert_eq!(summary.batches, 0);
        assert_eq!(summary.alarmed, 0);
        assert_eq!(summary.alarm_rate, 0.0);
        assert_eq!(summary.mean_yield, 0.0);
    }

    #[test]
    fn trend_averages_trailing_window() {
        let rows: Vec<_> = (1..=5).map(|id| snapshot(id, id as f64, "")).collect();
        let trend = yield_trend(&rows, 3);
        let averages: Vec<_> = trend.iter().map(|p| p.moving_average).collect();
        assert_eq!(averages, vec![1.0, 1.5, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn trend_orders_by_timestamp() {
        let rows = vec![snapshot(3, 3.0, ""), snapshot(1, 1.0, ""), snapshot(2, 2.0, "")];
        let trend = yield_trend(&rows, DEFAULT_TREND_WINDOW);
        let ids: Vec<_> = trend.iter().map(|p| p.batch_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn trend_window_zero_degrades_to_per_row_values() {
        let rows: Vec<_> = (1..=3).map(|id| snapshot(id, id as f64, "")).collect();
        let trend = yield_trend(&rows, 0);
        for point in &trend {
            assert_eq!(point.moving_average, point.product_yield);
        }
    }

    #[test]
    fn breakdown_splits_joined_labels() {
        let rows = vec![
            snapshot(1, 1.0, "DOOutOfRange, HighTemp"),
            snapshot(2, 1.0, "HighTemp"),
            snapshot(3, 3.7, ""),
            snapshot(4, 0.2, "pHOutOfRange"),
        ];
        let tally = alarm_breakdown(&rows);
        assert_eq!(tally["DOOutOfRange"], 1);
        assert_eq!(tally["HighTemp"], 2);
        assert_eq!(tally["pHOutOfRange"], 1);
        let order: Vec<_> = tally.keys().cloned().collect();
        assert_eq!(order, vec!["DOOutOfRange", "HighTemp", "pHOutOfRange"]);
    }

    #[test]
    fn summary_serializes_for_json_output() {
        let rows = vec![snapshot(1, 3.7, "")];
        let summary = KpiSummary::from_snapshots(&rows);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["batches"], 1);
        assert_eq!(json["alarmed"], 0);
    }
}
