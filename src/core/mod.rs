// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! Core monitoring module - session state machine, history and pacing

mod event_bus;
mod history;
mod manual;
mod scheduler;
mod session;

pub use event_bus::{Event, EventBus, SessionEvent};
pub use history::{History, HistoryEntry, DEFAULT_HISTORY_CAPACITY};
pub use manual::{diagnose, Diagnosis, ManualInput, FieldRange, MANUAL_RANGES};
pub use scheduler::Pacer;
pub use session::StreamingSession;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detection::FaultSeverity;
use crate::telemetry::TelemetryReading;

/// Stop reason recorded when a tick classifies as Critical
pub const CRITICAL_STOP_REASON: &str = "Monitoring stopped due to CRITICAL FAULT. Reset to continue.";

/// Lifecycle phase of a monitoring session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Idle,
    Running,
    StoppedCritical,
}

/// Per-session state.
///
/// `stop_reason` is set exactly when the phase is `StoppedCritical`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub stop_reason: Option<String>,
    pub history: History,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            stop_reason: None,
            history: History::new(DEFAULT_HISTORY_CAPACITY),
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Running
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one processed tick
#[derive(Debug, Clone, Serialize)]
pub struct TickOutcome {
    /// Tick number within the current run, starting at 1
    pub tick: u64,
    pub reading: TelemetryReading,
    pub severity: FaultSeverity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Set when the log sink rejected the record
    pub log_error: Option<String>,
}

/// How a `run` ended
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub final_phase: SessionPhase,
    pub highest_severity: Option<FaultSeverity>,
    pub log_failures: u64,
}
