// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! One-off diagnosis of operator-entered readings

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::detection::{explain, FaultClassifier, FaultSeverity, FeatureVector};
use crate::error::{EngineError, EngineResult};
use crate::reconcile::{PartialReading, ReferenceDataset};
use crate::storage::{LogRecord, MaintenanceLog};
use crate::telemetry::{OperationalMode, TelemetryReading};

/// Accepted bounds for one manual field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
}

impl FieldRange {
    fn check(&self, value: f64) -> EngineResult<()> {
        if value.is_finite() && value >= self.min && value <= self.max {
            Ok(())
        } else {
            Err(EngineError::OutOfRange {
                field: self.field,
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Bounds for temperature, rpm, fuel efficiency, torque and power, in that order
pub const MANUAL_RANGES: [FieldRange; 5] = [
    FieldRange { field: "temperature", min: 17.0, max: 120.0 },
    FieldRange { field: "rpm", min: 800.0, max: 4000.0 },
    FieldRange { field: "fuel_efficiency", min: 4.0, max: 30.0 },
    FieldRange { field: "torque", min: 40.0, max: 200.0 },
    FieldRange { field: "power_output", min: 20.0, max: 100.0 },
];

/// Readings typed in by an operator; vibration is never measured
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManualInput {
    pub temperature: f64,
    pub rpm: f64,
    pub fuel_efficiency: f64,
    pub torque: f64,
    pub power_output: f64,
    pub mode: OperationalMode,
}

impl ManualInput {
    /// Range-check every numeric field
    pub fn validate(&self) -> EngineResult<()> {
        let values = [
            self.temperature,
            self.rpm,
            self.fuel_efficiency,
            self.torque,
            self.power_output,
        ];
        for (range, value) in MANUAL_RANGES.iter().zip(values) {
            range.check(value)?;
        }
        Ok(())
    }

    pub fn partial(&self) -> PartialReading {
        PartialReading {
            temperature: self.temperature,
            rpm: self.rpm,
            fuel_efficiency: self.fuel_efficiency,
            torque: self.torque,
            power_output: self.power_output,
        }
    }
}

/// Result of a manual diagnosis
#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
    /// The completed reading, vibration borrowed from the reference row
    pub reading: TelemetryReading,
    pub severity: FaultSeverity,
    pub message: String,
    pub row_index: usize,
    pub distance: f64,
    pub log_error: Option<String>,
}

/// Complete, classify, explain and log a manual entry.
///
/// Input is validated first. A log sink failure is reported in the
/// diagnosis and does not discard the classification.
pub fn diagnose(
    input: &ManualInput,
    dataset: &ReferenceDataset,
    classifier: &FaultClassifier,
    log: Option<&MaintenanceLog>,
) -> EngineResult<Diagnosis> {
    input.validate()?;

    let matched = dataset.reconcile(&input.partial())?;
    let reading = TelemetryReading {
        temperature: input.temperature,
        rpm: input.rpm.round() as u32,
        fuel_efficiency: input.fuel_efficiency,
        torque: input.torque,
        power_output: input.power_output,
        vibration: matched.vibration,
        mode: input.mode,
    };

    let severity = classifier.classify(&FeatureVector::from_reading(&reading))?;
    let message = explain(
        severity,
        reading.temperature,
        reading.vibration.average(),
        Some(reading.torque),
        Some(reading.power_output),
    );
    info!(
        "Manual diagnosis: {} (reference row {}, distance {:.3})",
        severity, matched.row_index, matched.distance
    );

    let log_error = log.and_then(|log| {
        log.append(&LogRecord::new(reading.clone(), severity, Some(matched.row_index)))
            .err()
            .map(|e| {
                warn!("Log write failed: {}", e);
                e.to_string()
            })
    });

    Ok(Diagnosis {
        reading,
        severity,
        message,
        row_index: matched.row_index,
        distance: matched.distance,
        log_error,
    })
}
