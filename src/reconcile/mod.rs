// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! Reference dataset and nearest-neighbour feature completion

use std::path::Path;

use nalgebra::Vector5;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::telemetry::Vibration;

/// Column aliases accepted for each required field
const TEMPERATURE_COLUMNS: &[&str] = &["Temperature (°C)", "Temperature"];
const RPM_COLUMNS: &[&str] = &["RPM"];
const FUEL_COLUMNS: &[&str] = &["Fuel_Efficiency"];
const TORQUE_COLUMNS: &[&str] = &["Torque"];
const POWER_COLUMNS: &[&str] = &["Power_Output (kW)", "Power_Output"];
const VIB_X_COLUMNS: &[&str] = &["Vibration_X"];
const VIB_Y_COLUMNS: &[&str] = &["Vibration_Y"];
const VIB_Z_COLUMNS: &[&str] = &["Vibration_Z"];

/// The measured subset of a manual entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartialReading {
    pub temperature: f64,
    pub rpm: f64,
    pub fuel_efficiency: f64,
    pub torque: f64,
    pub power_output: f64,
}

impl PartialReading {
    fn as_point(&self) -> Vector5<f64> {
        Vector5::new(self.temperature, self.rpm, self.fuel_efficiency, self.torque, self.power_output)
    }
}

/// One row of the reference dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub measured: PartialReading,
    pub vibration: Vibration,
}

/// Result of a nearest-neighbour lookup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub vibration: Vibration,
    pub row_index: usize,
    pub distance: f64,
}

/// Read-only tabular reference data, loaded once
#[derive(Debug, Clone, Default)]
pub struct ReferenceDataset {
    headers: Vec<String>,
    raw: Vec<Vec<String>>,
    rows: Vec<ReferenceRow>,
}

impl ReferenceDataset {
    /// Build directly from parsed rows
    pub fn from_rows(rows: Vec<ReferenceRow>) -> Self {
        let headers = [
            "Temperature (°C)", "RPM", "Fuel_Efficiency", "Torque", "Power_Output (kW)",
            "Vibration_X", "Vibration_Y", "Vibration_Z",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let raw = rows
            .iter()
            .map(|r| {
                [
                    r.measured.temperature, r.measured.rpm, r.measured.fuel_efficiency,
                    r.measured.torque, r.measured.power_output,
                    r.vibration.x, r.vibration.y, r.vibration.z,
                ]
                .iter()
                .map(|v| v.to_string())
                .collect()
            })
            .collect();

        Self { headers, raw, rows }
    }

    /// Load a CSV file with a header row
    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Dataset(format!("failed to read {:?}: {}", path, e)))?;
        let dataset = Self::parse(&content)?;
        info!("Loaded reference dataset from {:?} ({} rows)", path, dataset.len());
        Ok(dataset)
    }

    /// Parse CSV text; extra columns are kept for inspection but ignored for matching
    pub fn parse(content: &str) -> EngineResult<Self> {
        let mut lines = content.lines().filter(|l| !l.trim().is_empty());

        let header_line = lines
            .next()
            .ok_or_else(|| EngineError::Dataset("missing header row".into()))?;
        let headers: Vec<String> = split_csv_line(header_line);

        let find = |aliases: &[&str]| -> EngineResult<usize> {
            headers
                .iter()
                .position(|h| aliases.contains(&h.as_str()))
                .ok_or_else(|| EngineError::Dataset(format!("missing column {}", aliases[0])))
        };

        let columns = [
            find(TEMPERATURE_COLUMNS)?,
            find(RPM_COLUMNS)?,
            find(FUEL_COLUMNS)?,
            find(TORQUE_COLUMNS)?,
            find(POWER_COLUMNS)?,
            find(VIB_X_COLUMNS)?,
            find(VIB_Y_COLUMNS)?,
            find(VIB_Z_COLUMNS)?,
        ];

        let mut raw = Vec::new();
        let mut rows = Vec::new();

        for (line_no, line) in lines.enumerate() {
            let fields = split_csv_line(line);
            let mut values = [0.0f64; 8];
            for (slot, &col) in values.iter_mut().zip(columns.iter()) {
                let field = fields.get(col).ok_or_else(|| {
                    EngineError::Dataset(format!("row {} has no column {}", line_no, headers[col]))
                })?;
                *slot = field
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        EngineError::Dataset(format!(
                            "row {} column {}: '{}' is not a finite number",
                            line_no, headers[col], field
                        ))
                    })?;
            }

            rows.push(ReferenceRow {
                measured: PartialReading {
                    temperature: values[0],
                    rpm: values[1],
                    fuel_efficiency: values[2],
                    torque: values[3],
                    power_output: values[4],
                },
                vibration: Vibration::new(values[5], values[6], values[7]),
            });
            raw.push(fields);
        }

        Ok(Self { headers, raw, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&ReferenceRow> {
        self.rows.get(index)
    }

    /// Every column of a row as (header, value) pairs
    pub fn inspect(&self, index: usize) -> Option<Vec<(String, String)>> {
        self.raw.get(index).map(|fields| {
            self.headers
                .iter()
                .cloned()
                .zip(fields.iter().cloned())
                .collect()
        })
    }

    /// Find the row closest to `query` and borrow its vibration axes.
    ///
    /// Euclidean distance over (temperature, rpm, fuel efficiency, torque,
    /// power). Ties resolve to the earliest row.
    pub fn reconcile(&self, query: &PartialReading) -> EngineResult<Reconciliation> {
        let target = query.as_point();

        let (row_index, distance) = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| (i, (row.measured.as_point() - target).norm()))
            .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                Some((_, best_d)) if best_d <= d => best,
                _ => Some((i, d)),
            })
            .ok_or(EngineError::EmptyReference)?;

        debug!("Reconciled manual input to reference row {} (distance {:.4})", row_index, distance);

        Ok(Reconciliation {
            vibration: self.rows[row_index].vibration,
            row_index,
            distance,
        })
    }
}

fn split_csv_line(line: &str) -> Vec<String> {
    line.split(',')
        .map(|f| f.trim().trim_matches('"').to_string())
        .collect()
}
