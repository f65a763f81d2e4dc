//! ---
//! bmd_section: "02-simulation"
//! bmd_subsection: "module"
//! bmd_type: "source"
//! bmd_scope: "code"
//! bmd_description: "Persisted batch snapshot record type."
//! bmd_version: "v0.1.0"
//! bmd_owner: "tbd"
//! ---
use chrono::NaiveDateTime;
use p_bmd_common::clock::serde_timestamp;
use serde::{Deserialize, Serialize};

/// One synthetic process-state record.
///
/// The serde renames pin the persisted column names; changing them breaks
/// every existing `batch_data.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSnapshot {
    #[serde(rename = "Timestamp", with = "serde_timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "BatchID")]
    pub batch_id: u64,
    /// Percent saturation, rounded to 1 decimal place.
    #[serde(rename = "DissolvedOxygen")]
    pub dissolved_oxygen: f64,
    /// Degrees Celsius, rounded to 1 decimal place.
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    /// Rounded to 2 decimal places.
    #[serde(rename = "pH")]
    pub ph: f64,
    /// Grams, rounded to 2 decimal places, never negative.
    #[serde(rename = "Yield")]
    pub product_yield: f64,
    /// Stored as `0`/`1` at rest.
    #[serde(rename = "AlarmTriggered", with = "alarm_flag")]
    pub alarm_triggered: bool,
    /// Comma-joined alarm labels, empty when the batch ran clean.
    #[serde(rename = "AlarmType(s)")]
    pub alarm_types: String,
}

impl BatchSnapshot {
    /// Individual alarm labels parsed back out of the joined field.
    pub fn alarm_labels(&self) -> impl Iterator<Item = &str> {
        self.alarm_types
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }

    /// The flag must agree with the label field; rows violating this were
    /// written by something other than the generator.
    pub fn is_consistent(&self) -> bool {
        self.alarm_triggered == !self.alarm_types.is_empty()
    }
}

mod alarm_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(u8::from(*flag))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(u8::deserialize(deserializer)? != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> BatchSnapshot {
        BatchSnapshot {
            timestamp: NaiveDate::from_ymd_opt(2025, 1, 2)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            batch_id: 7,
            dissolved_oxygen: 51.3,
            temperature: 36.4,
            ph: 7.02,
            product_yield: 2.11,
            alarm_triggered: true,
            alarm_types: "DOOutOfRange".into(),
        }
    }

    #[test]
    fn csv_row_uses_contract_columns() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(sample()).unwrap();
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Timestamp,BatchID,DissolvedOxygen,Temperature,pH,Yield,AlarmTriggered,AlarmType(s)"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2025-01-02 08:00:00,7,51.3,36.4,7.02,2.11,1,DOOutOfRange"
        );
    }

    #[test]
    fn csv_row_round_trips() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(sample()).unwrap();
        let bytes = writer.into_inner().unwrap();
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let parsed: BatchSnapshot = reader.deserialize().next().unwrap().unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn alarm_labels_split_joined_field() {
        let mut snapshot = sample();
        snapshot.alarm_types = "DOOutOfRange, HighTemp, pHOutOfRange".into();
        let labels: Vec<_> = snapshot.alarm_labels().collect();
        assert_eq!(labels, vec!["DOOutOfRange", "HighTemp", "pHOutOfRange"]);
    }

    #[test]
    fn clean_snapshot_has_no_labels() {
        let mut snapshot = sample();
        snapshot.alarm_triggered = false;
        snapshot.alarm_types = String::new();
        assert_eq!(snapshot.alarm_labels().count(), 0);
        assert!(snapshot.is_consistent());
    }

    #[test]
    fn flag_label_mismatch_is_flagged() {
        let mut snapshot = sample();
        snapshot.alarm_types = String::new();
        assert!(!snapshot.is_consistent());
    }
}
