// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! End-to-end checks against the bundled demo assets

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use enginewatch::config::SessionConfig;
use enginewatch::core::CRITICAL_STOP_REASON;
use enginewatch::reconcile::PartialReading;
use enginewatch::telemetry::Vibration;
use enginewatch::{
    diagnose, explain, EngineSimulator, FaultClassifier, FaultSeverity, LiveTelemetrySource,
    LogSummary, MaintenanceLog, ManualInput, OperationalMode, ReferenceDataset, SessionPhase,
    StreamingSession, TelemetryReading, TelemetrySource,
};

fn asset(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets").join(name)
}

fn classifier() -> Arc<FaultClassifier> {
    Arc::new(FaultClassifier::from_path(&asset("engine_model.json")).unwrap())
}

fn fast_session_config(max_ticks: u64) -> SessionConfig {
    SessionConfig {
        tick_interval_ms: 0,
        max_ticks,
    }
}

struct ScriptedSource {
    temperatures: Vec<f64>,
    next: usize,
}

#[async_trait]
impl TelemetrySource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn next_reading(&mut self) -> TelemetryReading {
        let index = self.next.min(self.temperatures.len() - 1);
        self.next += 1;
        TelemetryReading {
            temperature: self.temperatures[index],
            rpm: 2000,
            fuel_efficiency: 16.0,
            torque: 100.0,
            power_output: 20.94,
            vibration: Vibration::new(0.3, 0.3, 0.3),
            mode: OperationalMode::Cruising,
        }
    }
}

#[test]
fn critical_explanation_lists_clauses_in_order() {
    let vibration = Vibration::new(1.1, 1.2, 1.3);
    let message = explain(
        FaultSeverity::Critical,
        115.0,
        vibration.average(),
        Some(50.0),
        Some(20.0),
    );

    assert_eq!(
        message,
        "CRITICAL FAULT! Stop engine immediately! \
         Engine severely overheated (115.00°C). \
         Extreme vibration detected (1.20). \
         Severe power loss (Torque=50.00, Power=20.00)."
    );
}

#[tokio::test]
async fn unresponsive_endpoint_falls_back_and_session_continues() {
    // Accepts connections and never answers
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let source = LiveTelemetrySource::new(
        &format!("http://{}/telemetry", addr),
        Duration::from_millis(200),
        EngineSimulator::with_seed(5),
    )
    .unwrap();
    let mut reference = EngineSimulator::with_seed(5);

    let mut session = StreamingSession::new(source, classifier(), fast_session_config(3));
    session.start();

    let mut ticks = 0;
    while let Some(outcome) = session.tick().await.unwrap() {
        assert_eq!(outcome.reading, reference.step());
        ticks += 1;
    }

    assert!(ticks >= 1);
    assert_eq!(session.source().fallback_count(), ticks);
    assert_eq!(session.source().live_count(), 0);
    assert_ne!(session.state().phase, SessionPhase::Running);
}

#[test]
fn manual_input_matching_row_three_borrows_its_vibration() {
    let dataset = ReferenceDataset::load(&asset("engine_failure_features.csv")).unwrap();
    let row = dataset.row(3).unwrap().clone();

    let matched = dataset.reconcile(&row.measured).unwrap();
    assert_eq!(matched.row_index, 3);
    assert_eq!(matched.distance, 0.0);
    assert_eq!(matched.vibration, row.vibration);

    let PartialReading {
        temperature,
        rpm,
        fuel_efficiency,
        torque,
        power_output,
    } = row.measured;
    let input = ManualInput {
        temperature,
        rpm,
        fuel_efficiency,
        torque,
        power_output,
        mode: OperationalMode::Cruising,
    };

    let dir = tempfile::tempdir().unwrap();
    let log = MaintenanceLog::new(dir.path().join("maintenance_log.csv"));
    let diagnosis = diagnose(&input, &dataset, &classifier(), Some(&log)).unwrap();

    assert_eq!(diagnosis.row_index, 3);
    assert_eq!(diagnosis.reading.vibration, row.vibration);
    assert_eq!(LogSummary::load(log.path()).unwrap().dataset_rows(), vec![3]);
}

#[tokio::test]
async fn critical_stop_then_reset() {
    let source = ScriptedSource {
        temperatures: vec![90.0, 115.0, 90.0],
        next: 0,
    };
    let mut session = StreamingSession::new(source, classifier(), fast_session_config(1000));
    let (tx, rx) = broadcast::channel(1);

    let summary = session.run(rx).await.unwrap();
    assert_eq!(summary.ticks, 2);
    assert_eq!(summary.final_phase, SessionPhase::StoppedCritical);
    assert_eq!(session.state().stop_reason.as_deref(), Some(CRITICAL_STOP_REASON));
    assert_eq!(session.state().history.len(), 2);

    assert!(session.tick().await.unwrap().is_none());

    assert!(session.reset());
    assert!(session.state().history.is_empty());
    assert!(session.state().stop_reason.is_none());

    let outcome = session.tick().await.unwrap().unwrap();
    assert_eq!(outcome.severity, FaultSeverity::Normal);
    drop(tx);
}

#[tokio::test]
async fn simulated_run_logs_every_tick() {
    let dir = tempfile::tempdir().unwrap();
    let log = MaintenanceLog::new(dir.path().join("maintenance_log.csv"));
    let mut session = StreamingSession::new(
        EngineSimulator::with_seed(99),
        classifier(),
        fast_session_config(25),
    )
    .with_log(log.clone());

    let (_tx, rx) = broadcast::channel(1);
    let summary = session.run(rx).await.unwrap();

    let logged = LogSummary::load(log.path()).unwrap();
    assert_eq!(logged.entries.len() as u64, summary.ticks);
    assert_eq!(logged.skipped, 0);
    assert!(logged.dataset_rows().is_empty());
    assert!(session.state().history.len() <= 5);
}
