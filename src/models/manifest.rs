use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key timestamp, second granularity.
pub const KEY_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

pub fn data_object_key(table: &str, at: DateTime<Utc>) -> String {
    format!("backups/{}/{}.csv", table, at.format(KEY_TIMESTAMP_FORMAT))
}

pub fn manifest_key(at: DateTime<Utc>) -> String {
    format!("backups/metadata/{}.json", at.format(KEY_TIMESTAMP_FORMAT))
}

/// Outcome of exporting one table.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportRecord {
    Written { key: String, rows: usize },
    /// Nothing matched the selection window; no object was written.
    Empty,
    Failed { error: String },
}

impl ExportRecord {
    pub fn key(&self) -> Option<&str> {
        match self {
            ExportRecord::Written { key, .. } => Some(key),
            ExportRecord::Empty | ExportRecord::Failed { .. } => None,
        }
    }
}

impl fmt::Display for ExportRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportRecord::Written { key, rows } => write!(f, "{rows} rows -> {key}"),
            ExportRecord::Empty => write!(f, "no new data"),
            ExportRecord::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ManifestStatus {
    Success,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    pub timestamp: String,
    pub backup_files: Vec<String>,
    pub status: ManifestStatus,
    pub tables_count: usize,
}

impl Manifest {
    /// Collects the keys of tables that produced an object, preserving export order.
    pub fn from_records(at: DateTime<Utc>, records: &[ExportRecord]) -> Self {
        let backup_files: Vec<String> = records
            .iter()
            .filter_map(|r| r.key().map(str::to_string))
            .collect();

        Self {
            timestamp: at.to_rfc3339_opts(SecondsFormat::Micros, true),
            tables_count: backup_files.len(),
            backup_files,
            status: ManifestStatus::Success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 3, 5, 9).unwrap()
    }

    #[test]
    fn keys_use_second_granularity_timestamps() {
        assert_eq!(data_object_key("owners", at()), "backups/owners/20240517-030509.csv");
        assert_eq!(manifest_key(at()), "backups/metadata/20240517-030509.json");
    }

    #[test]
    fn manifest_lists_only_written_keys() {
        let records = vec![
            ExportRecord::Written { key: "backups/owners/20240517-030509.csv".into(), rows: 2 },
            ExportRecord::Empty,
            ExportRecord::Failed { error: "boom".into() },
            ExportRecord::Written { key: "backups/visits/20240517-030510.csv".into(), rows: 1 },
        ];

        let manifest = Manifest::from_records(at(), &records);
        assert_eq!(
            manifest.backup_files,
            vec!["backups/owners/20240517-030509.csv", "backups/visits/20240517-030510.csv"]
        );
        assert_eq!(manifest.tables_count, manifest.backup_files.len());
    }

    #[test]
    fn manifest_serializes_to_the_published_shape() {
        let manifest = Manifest::from_records(at(), &[ExportRecord::Empty]);
        let value = serde_json::to_value(&manifest).unwrap();

        assert_eq!(
            value,
            json!({
                "timestamp": "2024-05-17T03:05:09.000000Z",
                "backup_files": [],
                "status": "success",
                "tables_count": 0
            })
        );
    }
}
