// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! EngineWatch - Engine Condition Monitoring
//!
//! Periodic engine telemetry is classified into a fault severity and fed
//! through a bounded monitoring loop that halts itself on a critical fault
//! until explicitly reset.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Streaming Session                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌───────────┐   ┌──────────┐   ┌─────────┐  │
//! │  │ Telemetry │ → │ Features  │ → │ Fault    │ → │ Fault   │  │
//! │  │ Source    │   │ (one-hot) │   │ Classif. │   │ Narrator│  │
//! │  └───────────┘   └───────────┘   └──────────┘   └─────────┘  │
//! │        ↑               ↑                             ↓       │
//! │  ┌───────────┐   ┌───────────┐   ┌──────────┐   ┌─────────┐  │
//! │  │ Simulator │   │ Reconciler│   │ History  │   │ Event   │  │
//! │  │ / Live    │   │ (manual)  │   │ + Log    │   │ Bus     │  │
//! │  └───────────┘   └───────────┘   └──────────┘   └─────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod core;
pub mod detection;
pub mod error;
pub mod reconcile;
pub mod storage;
pub mod telemetry;

// Re-exports for convenience
pub use config::Config;
pub use crate::core::{
    diagnose, Diagnosis, EventBus, ManualInput, SessionPhase, SessionState, StreamingSession,
    TickOutcome,
};
pub use detection::{explain, DecisionTreeModel, FaultClassifier, FaultSeverity, FeatureVector};
pub use error::{EngineError, EngineResult};
pub use reconcile::ReferenceDataset;
pub use storage::{LogRecord, LogSummary, MaintenanceLog};
pub use telemetry::{
    EngineSimulator, LiveTelemetrySource, OperationalMode, TelemetryReading, TelemetrySource,
};

/// EngineWatch version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// EngineWatch name
pub const NAME: &str = "EngineWatch";
