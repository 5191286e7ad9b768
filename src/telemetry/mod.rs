// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! Telemetry module - readings, the source trait, synthetic and live sources

mod live;
mod simulator;

pub use live::{LiveTelemetrySource, TelemetryPayload};
pub use simulator::{EngineSimState, EngineSimulator};

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Engine operating regime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationalMode {
    Idle,
    Cruising,
    HeavyLoad,
}

impl OperationalMode {
    /// All modes, in the order the simulator samples them
    pub const ALL: [OperationalMode; 3] = [
        OperationalMode::Idle,
        OperationalMode::Cruising,
        OperationalMode::HeavyLoad,
    ];

    /// Name used by the telemetry endpoint and the log file
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationalMode::Idle => "Idle",
            OperationalMode::Cruising => "Cruising",
            OperationalMode::HeavyLoad => "Heavy Load",
        }
    }
}

impl fmt::Display for OperationalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationalMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "idle" => Ok(OperationalMode::Idle),
            "cruising" => Ok(OperationalMode::Cruising),
            "heavyload" => Ok(OperationalMode::HeavyLoad),
            _ => Err(EngineError::UnknownMode(s.to_string())),
        }
    }
}

/// Three-axis vibration measurement
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vibration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vibration {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Mean of the three axes
    pub fn average(&self) -> f64 {
        (self.x + self.y + self.z) / 3.0
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// A single engine telemetry sample, produced once per tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryReading {
    /// Coolant temperature in °C
    pub temperature: f64,
    pub rpm: u32,
    /// km/l
    pub fuel_efficiency: f64,
    /// Nm
    pub torque: f64,
    /// kW
    pub power_output: f64,
    pub vibration: Vibration,
    pub mode: OperationalMode,
}

/// Anything that yields one reading per tick.
///
/// Sources never fail: a source backed by something unreliable is
/// expected to degrade internally rather than surface the error.
#[async_trait]
pub trait TelemetrySource: Send {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Produce the reading for the next tick
    async fn next_reading(&mut self) -> TelemetryReading;
}

/// Round to a fixed number of decimal places
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing_accepts_endpoint_spelling() {
        assert_eq!("Heavy Load".parse::<OperationalMode>().unwrap(), OperationalMode::HeavyLoad);
        assert_eq!("heavy_load".parse::<OperationalMode>().unwrap(), OperationalMode::HeavyLoad);
        assert_eq!("Idle".parse::<OperationalMode>().unwrap(), OperationalMode::Idle);
        assert!("Reverse".parse::<OperationalMode>().is_err());
    }

    #[test]
    fn test_mode_display_round_trips() {
        for mode in OperationalMode::ALL {
            assert_eq!(mode.to_string().parse::<OperationalMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_vibration_average() {
        let vib = Vibration::new(1.1, 1.2, 1.3);
        assert!((vib.average() - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(12.3456, 2), 12.35);
        assert_eq!(round_to(0.12345, 3), 0.123);
    }
}
