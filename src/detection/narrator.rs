// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! Human-readable fault explanations

use super::FaultSeverity;

/// Explain a classification in plain words.
///
/// The base sentence depends only on `severity`; detail clauses are appended
/// in a fixed order when their thresholds are exceeded. Torque/power detail
/// needs both values present and non-zero.
pub fn explain(
    severity: FaultSeverity,
    temperature: f64,
    vibration_avg: f64,
    torque: Option<f64>,
    power_output: Option<f64>,
) -> String {
    let load = match (torque, power_output) {
        (Some(t), Some(p)) if t != 0.0 && p != 0.0 => Some((t, p)),
        _ => None,
    };

    let mut msg = String::new();
    match severity {
        FaultSeverity::Normal => {
            msg.push_str("Engine operating normally.");
        }
        FaultSeverity::Minor => {
            msg.push_str("Minor fault detected.");
            if temperature > 95.0 {
                msg.push_str(&format!(" Engine temperature slightly high ({:.2}°C).", temperature));
            }
            if vibration_avg > 0.5 {
                msg.push_str(&format!(" Vibration slightly elevated ({:.2}).", vibration_avg));
            }
        }
        FaultSeverity::Major => {
            msg.push_str("Major fault detected!");
            if temperature > 100.0 {
                msg.push_str(&format!(" Engine temperature critical ({:.2}°C).", temperature));
            }
            if vibration_avg > 0.7 {
                msg.push_str(&format!(" Vibration above normal ({:.2}).", vibration_avg));
            }
            if let Some((t, p)) = load {
                msg.push_str(&format!(" Torque/power below expected (Torque={:.2}, Power={:.2}).", t, p));
            }
        }
        FaultSeverity::Critical => {
            msg.push_str("CRITICAL FAULT! Stop engine immediately!");
            if temperature > 110.0 {
                msg.push_str(&format!(" Engine severely overheated ({:.2}°C).", temperature));
            }
            if vibration_avg > 1.0 {
                msg.push_str(&format!(" Extreme vibration detected ({:.2}).", vibration_avg));
            }
            if let Some((t, p)) = load {
                msg.push_str(&format!(" Severe power loss (Torque={:.2}, Power={:.2}).", t, p));
            }
        }
    }
    msg
}
