// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! Maintenance log persistence

mod reader;

pub use reader::{LogEntry, LogSummary};

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::detection::FaultSeverity;
use crate::error::{EngineError, EngineResult};
use crate::telemetry::{round_to, TelemetryReading};

/// Column order of the log file
pub const LOG_COLUMNS: [&str; 12] = [
    "Temperature (°C)",
    "RPM",
    "Fuel_Efficiency",
    "Vibration_X",
    "Vibration_Y",
    "Vibration_Z",
    "Torque",
    "Power_Output (kW)",
    "Operational_Mode",
    "Prediction",
    "Dataset_Row_Index",
    "Timestamp",
];

/// One persisted classification, created once per tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub reading: TelemetryReading,
    pub severity: FaultSeverity,
    /// Reference row used to complete a manual entry
    pub dataset_row: Option<usize>,
    pub timestamp: DateTime<Utc>,
}

impl LogRecord {
    pub fn new(reading: TelemetryReading, severity: FaultSeverity, dataset_row: Option<usize>) -> Self {
        Self {
            reading,
            severity,
            dataset_row,
            timestamp: Utc::now(),
        }
    }

    /// CSV line in `LOG_COLUMNS` order, without trailing newline
    pub fn to_csv_line(&self) -> String {
        let r = &self.reading;
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            round_to(r.temperature, 2),
            r.rpm,
            round_to(r.fuel_efficiency, 2),
            round_to(r.vibration.x, 2),
            round_to(r.vibration.y, 2),
            round_to(r.vibration.z, 2),
            round_to(r.torque, 2),
            round_to(r.power_output, 2),
            r.mode.as_str(),
            self.severity.code(),
            self.dataset_row.map(|i| i.to_string()).unwrap_or_default(),
            self.timestamp.to_rfc3339(),
        )
    }
}

/// Append-only CSV maintenance log.
///
/// The header is written only when the file is new or empty. Single writer;
/// concurrent writers must be serialized by the caller.
#[derive(Debug, Clone)]
pub struct MaintenanceLog {
    path: PathBuf,
}

impl MaintenanceLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record
    pub fn append(&self, record: &LogRecord) -> EngineResult<()> {
        self.write_line(record).map_err(|source| EngineError::LogWrite {
            path: self.path.clone(),
            source,
        })?;
        debug!("Logged {} to {:?}", record.severity, self.path);
        Ok(())
    }

    fn write_line(&self, record: &LogRecord) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;
        let mut writer = BufWriter::new(file);

        if needs_header {
            writeln!(writer, "{}", LOG_COLUMNS.join(","))?;
            info!("Created maintenance log at {:?}", self.path);
        }
        writeln!(writer, "{}", record.to_csv_line())?;
        writer.flush()
    }

    /// Read the log back for reporting
    pub fn summary(&self) -> EngineResult<LogSummary> {
        LogSummary::load(&self.path)
    }
}
