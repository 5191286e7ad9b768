// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! Live telemetry over HTTP with per-tick synthetic fallback

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{EngineSimulator, OperationalMode, TelemetryReading, TelemetrySource, Vibration};
use crate::error::{EngineError, EngineResult};

/// JSON shape served by the telemetry endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryPayload {
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "RPM")]
    pub rpm: f64,
    #[serde(rename = "Fuel_Efficiency")]
    pub fuel_efficiency: f64,
    #[serde(rename = "Torque")]
    pub torque: f64,
    #[serde(rename = "Power_Output")]
    pub power_output: f64,
    #[serde(rename = "Vibration_X")]
    pub vibration_x: f64,
    #[serde(rename = "Vibration_Y")]
    pub vibration_y: f64,
    #[serde(rename = "Vibration_Z")]
    pub vibration_z: f64,
    #[serde(rename = "Operational_Mode")]
    pub operational_mode: String,
}

impl From<&TelemetryReading> for TelemetryPayload {
    fn from(reading: &TelemetryReading) -> Self {
        Self {
            temperature: reading.temperature,
            rpm: reading.rpm as f64,
            fuel_efficiency: reading.fuel_efficiency,
            torque: reading.torque,
            power_output: reading.power_output,
            vibration_x: reading.vibration.x,
            vibration_y: reading.vibration.y,
            vibration_z: reading.vibration.z,
            operational_mode: reading.mode.as_str().to_string(),
        }
    }
}

impl TryFrom<TelemetryPayload> for TelemetryReading {
    type Error = EngineError;

    fn try_from(payload: TelemetryPayload) -> Result<Self, Self::Error> {
        let numeric = [
            payload.temperature,
            payload.rpm,
            payload.fuel_efficiency,
            payload.torque,
            payload.power_output,
            payload.vibration_x,
            payload.vibration_y,
            payload.vibration_z,
        ];
        if numeric.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::SourceUnavailable("non-finite value in payload".into()));
        }
        if payload.rpm < 0.0 || payload.rpm > u32::MAX as f64 {
            return Err(EngineError::SourceUnavailable(format!("rpm {} out of range", payload.rpm)));
        }
        if payload.vibration_x < 0.0 || payload.vibration_y < 0.0 || payload.vibration_z < 0.0 {
            return Err(EngineError::SourceUnavailable("negative vibration in payload".into()));
        }
        let mode: OperationalMode = payload
            .operational_mode
            .parse()
            .map_err(|e: EngineError| EngineError::SourceUnavailable(e.to_string()))?;

        Ok(TelemetryReading {
            temperature: payload.temperature,
            rpm: payload.rpm.round() as u32,
            fuel_efficiency: payload.fuel_efficiency,
            torque: payload.torque,
            power_output: payload.power_output,
            vibration: Vibration::new(payload.vibration_x, payload.vibration_y, payload.vibration_z),
            mode,
        })
    }
}

/// Pulls readings from a remote endpoint.
///
/// Any failure (timeout, transport, status, bad payload) is swallowed and
/// that tick is served by the owned simulator instead. There is no retry.
pub struct LiveTelemetrySource {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
    fallback: EngineSimulator,
    fallback_count: u64,
    live_count: u64,
}

impl LiveTelemetrySource {
    pub fn new(endpoint: &str, timeout: Duration, fallback: EngineSimulator) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::SourceUnavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            timeout,
            client,
            fallback,
            fallback_count: 0,
            live_count: 0,
        })
    }

    /// Ticks served by the synthetic fallback so far
    pub fn fallback_count(&self) -> u64 {
        self.fallback_count
    }

    /// Ticks served by the endpoint so far
    pub fn live_count(&self) -> u64 {
        self.live_count
    }

    /// State of the fallback engine
    pub fn fallback(&self) -> &EngineSimulator {
        &self.fallback
    }

    async fn fetch(&self) -> EngineResult<TelemetryReading> {
        let request = async {
            let response = self
                .client
                .get(&self.endpoint)
                .send()
                .await
                .map_err(|e| EngineError::SourceUnavailable(e.to_string()))?;

            if !response.status().is_success() {
                return Err(EngineError::SourceUnavailable(format!(
                    "endpoint returned status {}",
                    response.status()
                )));
            }

            let payload: TelemetryPayload = response
                .json()
                .await
                .map_err(|e| EngineError::SourceUnavailable(format!("malformed payload: {}", e)))?;

            TelemetryReading::try_from(payload)
        };

        // The client timeout covers the transfer; this bounds the whole call
        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::SourceUnavailable(format!(
                "no response within {:?}",
                self.timeout
            ))),
        }
    }
}

#[async_trait]
impl TelemetrySource for LiveTelemetrySource {
    fn name(&self) -> &str {
        &self.endpoint
    }

    async fn next_reading(&mut self) -> TelemetryReading {
        match self.fetch().await {
            Ok(reading) => {
                self.live_count += 1;
                reading
            }
            Err(e) => {
                self.fallback_count += 1;
                if self.fallback_count == 1 {
                    warn!("Live telemetry unavailable ({}), using synthetic readings", e);
                } else {
                    debug!("Live telemetry fallback #{}: {}", self.fallback_count, e);
                }
                self.fallback.step()
            }
        }
    }
}
