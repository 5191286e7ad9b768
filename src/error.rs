// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! Error types for the monitoring core

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the library
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by the telemetry, classification and logging pipeline
#[derive(Debug, Error)]
pub enum EngineError {
    /// Live telemetry call failed; always recovered by synthetic fallback
    #[error("telemetry source unavailable: {0}")]
    SourceUnavailable(String),

    /// Reconciliation was asked to search a dataset with no rows
    #[error("reference dataset has no rows")]
    EmptyReference,

    /// Feature vector layout disagrees with the loaded model
    #[error("feature schema mismatch: model expects {expected:?}, vector has {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// One-hot mode flags are all zero or more than one is set
    #[error("invalid operational mode encoding: flags {0:?} must contain exactly one 1.0")]
    InvalidModeEncoding([f64; 3]),

    /// Model produced a class outside Normal..=Critical
    #[error("model predicted unknown severity class {0}")]
    InvalidPrediction(i64),

    /// Log sink could not be written
    #[error("failed to write log record to {path:?}: {source}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reference dataset could not be parsed
    #[error("reference dataset error: {0}")]
    Dataset(String),

    /// Model artifact could not be loaded or evaluated
    #[error("model error: {0}")]
    Model(String),

    /// Manual input outside its documented bounds
    #[error("{field} = {value} is outside the accepted range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Operational mode string not recognised
    #[error("unknown operational mode '{0}'")]
    UnknownMode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
