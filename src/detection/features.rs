// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! Classifier input encoding

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::telemetry::{OperationalMode, TelemetryReading};

/// Column names of the trained schema, in order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Temperature (°C)",
    "RPM",
    "Fuel_Efficiency",
    "Vibration_X",
    "Vibration_Y",
    "Vibration_Z",
    "Torque",
    "Power_Output (kW)",
    "Operational_Mode_Cruising",
    "Operational_Mode_Heavy Load",
    "Operational_Mode_Idle",
];

pub const FEATURE_COUNT: usize = 11;

/// Index of the first one-hot mode flag
const MODE_OFFSET: usize = 8;

/// Ordered numeric encoding of one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn from_reading(reading: &TelemetryReading) -> Self {
        let [cruising, heavy, idle] = mode_flags(reading.mode);
        Self {
            values: [
                reading.temperature,
                reading.rpm as f64,
                reading.fuel_efficiency,
                reading.vibration.x,
                reading.vibration.y,
                reading.vibration.z,
                reading.torque,
                reading.power_output,
                cruising,
                heavy,
                idle,
            ],
        }
    }

    /// Wrap raw values; the mode encoding is checked here rather than trusted
    pub fn from_values(values: [f64; FEATURE_COUNT]) -> EngineResult<Self> {
        let vector = Self { values };
        vector.validate_mode_encoding()?;
        Ok(vector)
    }

    pub fn names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// (Cruising, Heavy Load, Idle) flags
    pub fn mode_flags(&self) -> [f64; 3] {
        [
            self.values[MODE_OFFSET],
            self.values[MODE_OFFSET + 1],
            self.values[MODE_OFFSET + 2],
        ]
    }

    /// Exactly one flag set to 1.0 and the rest 0.0
    pub fn validate_mode_encoding(&self) -> EngineResult<()> {
        let flags = self.mode_flags();
        let ones = flags.iter().filter(|&&f| f == 1.0).count();
        let zeros = flags.iter().filter(|&&f| f == 0.0).count();
        if ones == 1 && zeros == 2 {
            Ok(())
        } else {
            Err(EngineError::InvalidModeEncoding(flags))
        }
    }
}

fn mode_flags(mode: OperationalMode) -> [f64; 3] {
    match mode {
        OperationalMode::Cruising => [1.0, 0.0, 0.0],
        OperationalMode::HeavyLoad => [0.0, 1.0, 0.0],
        OperationalMode::Idle => [0.0, 0.0, 1.0],
    }
}
