//! ---
//! bmd_section: "01-core-functionality"
//! bmd_subsection: "module"
//! bmd_type: "source"
//! bmd_scope: "code"
//! bmd_description: "Shared primitives for the batch monitoring workspace."
//! bmd_version: "v0.1.0"
//! bmd_owner: "tbd"
//! ---
use chrono::{Duration, NaiveDateTime, Timelike, Utc};

/// On-disk timestamp layout shared by the store and every consumer.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fixed simulation epoch: one year before the wall clock, whole seconds.
///
/// A fresh history starts here and advances one batch interval per row, so a
/// default 60-batch run produces two months of back-dated batches.
pub fn simulation_epoch() -> NaiveDateTime {
    (Utc::now() - Duration::days(365))
        .naive_utc()
        .with_nanosecond(0)
        .expect("zero nanoseconds is always valid")
}

/// Spacing between consecutive batches.
pub fn batch_interval(hours: i64) -> Duration {
    Duration::hours(hours)
}

/// Render a timestamp in the persisted layout.
pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp in the persisted layout.
pub fn parse_timestamp(raw: &str) -> chrono::ParseResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
}

/// Serde adapter for [`NaiveDateTime`] fields stored in [`TIMESTAMP_FORMAT`].
pub mod serde_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_timestamp(*timestamp))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}
