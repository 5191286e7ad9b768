// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! Reading the maintenance log back for reports

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::detection::FaultSeverity;
use crate::error::EngineResult;

/// One parsed log row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub severity: FaultSeverity,
    pub dataset_row: Option<usize>,
    pub timestamp: String,
    /// Every column as written, keyed by header
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(header, _)| header == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Everything needed for the log view
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogSummary {
    pub headers: Vec<String>,
    pub entries: Vec<LogEntry>,
    /// Rows dropped because their prediction was not a valid class
    pub skipped: usize,
}

impl LogSummary {
    /// Load a log file; a missing file is an empty log
    pub fn load(path: &Path) -> EngineResult<Self> {
        if !path.exists() {
            debug!("No maintenance log at {:?}", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let summary = Self::parse(&content);
        if summary.skipped > 0 {
            warn!("Skipped {} log rows without a usable prediction", summary.skipped);
        }
        Ok(summary)
    }

    pub fn parse(content: &str) -> Self {
        let mut lines = content.lines().filter(|l| !l.trim().is_empty());
        let headers: Vec<String> = match lines.next() {
            Some(line) => line.split(',').map(|h| h.trim().to_string()).collect(),
            None => return Self::default(),
        };

        let column = |name: &str| headers.iter().position(|h| h == name);
        let prediction_col = column("Prediction");
        let row_col = column("Dataset_Row_Index");
        let timestamp_col = column("Timestamp");

        let mut entries = Vec::new();
        let mut skipped = 0;

        for line in lines {
            let values: Vec<&str> = line.split(',').map(str::trim).collect();
            let get = |col: Option<usize>| col.and_then(|c| values.get(c).copied());

            // Predictions may have been written as floats by other tools
            let severity = get(prediction_col)
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.fract() == 0.0)
                .and_then(|v| FaultSeverity::try_from(v as i64).ok());

            let Some(severity) = severity else {
                skipped += 1;
                continue;
            };

            let dataset_row = get(row_col)
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| *v >= 0.0)
                .map(|v| v as usize);

            entries.push(LogEntry {
                severity,
                dataset_row,
                timestamp: get(timestamp_col).unwrap_or_default().to_string(),
                fields: headers
                    .iter()
                    .cloned()
                    .zip(values.iter().map(|v| v.to_string()))
                    .collect(),
            });
        }

        Self { headers, entries, skipped }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent `n` entries, oldest first
    pub fn tail(&self, n: usize) -> &[LogEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    /// Number of entries per status
    pub fn status_counts(&self) -> BTreeMap<FaultSeverity, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.severity).or_insert(0) += 1;
        }
        counts
    }

    /// Distinct reference rows used by manual entries, in first-seen order
    pub fn dataset_rows(&self) -> Vec<usize> {
        let mut rows = Vec::new();
        for row in self.entries.iter().filter_map(|e| e.dataset_row) {
            if !rows.contains(&row) {
                rows.push(row);
            }
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
Temperature (°C),RPM,Fuel_Efficiency,Vibration_X,Vibration_Y,Vibration_Z,Torque,Power_Output (kW),Operational_Mode,Prediction,Dataset_Row_Index,Timestamp
90.5,2100,16.2,0.31,0.28,0.44,205.1,45.1,Cruising,0,,2026-10-01T10:00:00+00:00
97.1,3050,8.4,0.62,0.55,0.91,301.7,96.3,Heavy Load,1,,2026-10-01T10:00:02+00:00
101.2,2500,22.0,0.40,0.42,0.51,120.0,50.0,Idle,2,7,2026-10-01T10:05:00+00:00
88.0,810,12.9,0.19,0.22,0.31,80.4,6.8,Idle,oops,,2026-10-01T10:06:00+00:00
115.0,3400,6.1,1.1,1.2,1.3,50.0,20.0,Heavy Load,3.0,7,2026-10-01T10:07:00+00:00
99.0,2000,21.0,0.3,0.3,0.3,110.0,44.0,Cruising,1,2,2026-10-01T10:08:00+00:00
";

    #[test]
    fn test_bad_predictions_dropped() {
        let summary = LogSummary::parse(LOG);
        assert_eq!(summary.entries.len(), 5);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.entries[3].severity, FaultSeverity::Critical);
    }

    #[test]
    fn test_status_distribution() {
        let counts = LogSummary::parse(LOG).status_counts();
        assert_eq!(counts[&FaultSeverity::Normal], 1);
        assert_eq!(counts[&FaultSeverity::Minor], 2);
        assert_eq!(counts[&FaultSeverity::Major], 1);
        assert_eq!(counts[&FaultSeverity::Critical], 1);
    }

    #[test]
    fn test_dataset_rows_distinct_in_order() {
        assert_eq!(LogSummary::parse(LOG).dataset_rows(), vec![7, 2]);
    }

    #[test]
    fn test_tail_keeps_latest() {
        let summary = LogSummary::parse(LOG);
        let tail = summary.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[1].field("Temperature (°C)"), Some("99.0"));
        assert_eq!(summary.tail(50).len(), 5);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let summary = LogSummary::load(&dir.path().join("absent.csv")).unwrap();
        assert!(summary.is_empty());
    }
}
