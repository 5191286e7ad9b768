// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! Streaming monitoring session

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    EventBus, HistoryEntry, Pacer, RunSummary, SessionEvent, SessionPhase, SessionState,
    TickOutcome, CRITICAL_STOP_REASON,
};
use crate::config::SessionConfig;
use crate::detection::{explain, FaultClassifier, FeatureVector};
use crate::error::EngineResult;
use crate::storage::{LogRecord, MaintenanceLog};
use crate::telemetry::TelemetrySource;

/// Pulls telemetry, classifies it and enforces the critical-stop protocol.
///
/// A session owns its source and its state; run several sessions side by
/// side by giving each its own source.
pub struct StreamingSession<S: TelemetrySource> {
    id: Uuid,
    source: S,
    classifier: Arc<FaultClassifier>,
    log: Option<MaintenanceLog>,
    config: SessionConfig,
    state: SessionState,
    ticks_in_run: u64,
    total_ticks: u64,
    events: Option<Arc<EventBus>>,
}

impl<S: TelemetrySource> StreamingSession<S> {
    pub fn new(source: S, classifier: Arc<FaultClassifier>, config: SessionConfig) -> Self {
        let state = SessionState::default();
        Self {
            id: Uuid::new_v4(),
            source,
            classifier,
            log: None,
            config,
            state,
            ticks_in_run: 0,
            total_ticks: 0,
            events: None,
        }
    }

    /// Persist every tick to `log`
    pub fn with_log(mut self, log: MaintenanceLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Broadcast lifecycle and tick events on `bus`
    pub fn with_events(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Ticks processed over the session's lifetime
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Begin a fresh run from `Idle` or `StoppedCritical`.
    ///
    /// Returns false when already running.
    pub fn start(&mut self) -> bool {
        if self.state.phase == SessionPhase::Running {
            return false;
        }
        self.begin_run();
        info!("Session {} started via {}", self.id, self.source.name());
        self.publish(SessionEvent::Started { session_id: self.id });
        true
    }

    /// Leave a critical stop. Outside `StoppedCritical` this does nothing.
    pub fn reset(&mut self) -> bool {
        if self.state.phase != SessionPhase::StoppedCritical {
            debug!("Reset ignored in phase {:?}", self.state.phase);
            return false;
        }
        self.begin_run();
        info!("Session {} reset after critical stop", self.id);
        self.publish(SessionEvent::Reset { session_id: self.id });
        true
    }

    /// Operator stop; a critical stop stays in place until reset
    pub fn stop(&mut self) {
        if self.state.phase == SessionPhase::Running {
            self.state.phase = SessionPhase::Idle;
            info!("Session {} stopped after {} ticks", self.id, self.ticks_in_run);
        }
    }

    fn begin_run(&mut self) {
        self.state.phase = SessionPhase::Running;
        self.state.stop_reason = None;
        self.state.history.clear();
        self.ticks_in_run = 0;
    }

    /// Process one tick.
    ///
    /// Returns `Ok(None)` without touching the source unless the session is
    /// running and below the tick ceiling. Classification errors are
    /// returned; log sink failures are reported in the outcome instead.
    #[instrument(skip_all, fields(session = %self.id))]
    pub async fn tick(&mut self) -> EngineResult<Option<TickOutcome>> {
        if !self.state.is_active() {
            return Ok(None);
        }
        if self.ticks_in_run >= self.config.max_ticks {
            self.state.phase = SessionPhase::Idle;
            info!("Tick ceiling of {} reached", self.config.max_ticks);
            return Ok(None);
        }

        let reading = self.source.next_reading().await;
        let vector = FeatureVector::from_reading(&reading);
        let severity = self.classifier.classify(&vector)?;
        let message = explain(
            severity,
            reading.temperature,
            reading.vibration.average(),
            Some(reading.torque),
            Some(reading.power_output),
        );

        let record = LogRecord::new(reading.clone(), severity, None);
        let log_error = match &self.log {
            Some(log) => match log.append(&record) {
                Ok(()) => None,
                Err(e) => {
                    warn!("Log write failed: {}", e);
                    Some(e.to_string())
                }
            },
            None => None,
        };

        self.state.history.push(HistoryEntry {
            timestamp: record.timestamp,
            temperature: reading.temperature,
            rpm: reading.rpm,
            mode: reading.mode,
            severity,
        });

        self.ticks_in_run += 1;
        self.total_ticks += 1;

        let outcome = TickOutcome {
            tick: self.ticks_in_run,
            reading,
            severity,
            message,
            timestamp: record.timestamp,
            log_error,
        };
        debug!("Tick {}: {}", outcome.tick, outcome.severity);
        self.publish(SessionEvent::Tick {
            session_id: self.id,
            outcome: outcome.clone(),
        });

        if severity.is_critical() {
            self.state.phase = SessionPhase::StoppedCritical;
            self.state.stop_reason = Some(CRITICAL_STOP_REASON.to_string());
            warn!("Critical fault at tick {}, monitoring halted", outcome.tick);
            self.publish(SessionEvent::StoppedCritical {
                session_id: self.id,
                reason: CRITICAL_STOP_REASON.to_string(),
            });
        } else if self.ticks_in_run >= self.config.max_ticks {
            self.state.phase = SessionPhase::Idle;
            info!("Tick ceiling of {} reached", self.config.max_ticks);
        }

        Ok(Some(outcome))
    }

    /// Tick at the configured cadence until a critical stop, the tick
    /// ceiling, or a shutdown signal.
    ///
    /// An idle session is started first. A session halted on a critical
    /// fault returns at once; call `reset` before running it again.
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) -> EngineResult<RunSummary> {
        let mut summary = RunSummary {
            ticks: 0,
            final_phase: self.state.phase,
            highest_severity: None,
            log_failures: 0,
        };

        match self.state.phase {
            SessionPhase::StoppedCritical => {
                info!("Session {} awaiting reset, not running", self.id);
                return Ok(summary);
            }
            SessionPhase::Idle => {
                self.start();
            }
            SessionPhase::Running => {}
        }

        let mut pacer = Pacer::new(self.config.tick_interval());
        // A dropped sender means no one can ask us to stop, not a stop request
        let mut shutdown_open = true;

        while self.state.is_active() {
            tokio::select! {
                _ = pacer.wait() => {
                    let outcome = match self.tick().await {
                        Ok(Some(outcome)) => outcome,
                        Ok(None) => break,
                        Err(e) => {
                            self.stop();
                            return Err(e);
                        }
                    };
                    summary.ticks += 1;
                    if outcome.log_error.is_some() {
                        summary.log_failures += 1;
                    }
                    summary.highest_severity = summary.highest_severity.max(Some(outcome.severity));
                }
                signal = shutdown.recv(), if shutdown_open => match signal {
                    Ok(()) | Err(RecvError::Lagged(_)) => {
                        info!("Session {} shutting down...", self.id);
                        self.stop();
                        break;
                    }
                    Err(RecvError::Closed) => {
                        debug!("Shutdown channel closed, running until halted");
                        shutdown_open = false;
                    }
                },
            }
        }

        summary.final_phase = self.state.phase;
        self.publish(SessionEvent::Finished {
            session_id: self.id,
            ticks: summary.ticks,
        });
        Ok(summary)
    }

    fn publish(&self, event: SessionEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::fixtures::sample_tree;
    use crate::detection::FaultSeverity;
    use crate::telemetry::{EngineSimulator, OperationalMode, TelemetryReading, Vibration};
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Replays fixed temperatures, repeating the last one when exhausted
    struct ScriptedSource {
        temperatures: VecDeque<f64>,
        last: f64,
    }

    impl ScriptedSource {
        fn new(temperatures: &[f64]) -> Self {
            Self {
                temperatures: temperatures.iter().copied().collect(),
                last: 90.0,
            }
        }
    }

    #[async_trait]
    impl TelemetrySource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn next_reading(&mut self) -> TelemetryReading {
            if let Some(t) = self.temperatures.pop_front() {
                self.last = t;
            }
            TelemetryReading {
                temperature: self.last,
                rpm: 2000,
                fuel_efficiency: 15.0,
                torque: 200.0,
                power_output: 41.88,
                vibration: Vibration::new(0.2, 0.2, 0.3),
                mode: OperationalMode::Cruising,
            }
        }
    }

    fn classifier() -> Arc<FaultClassifier> {
        Arc::new(FaultClassifier::new(Box::new(sample_tree())).unwrap())
    }

    fn config(max_ticks: u64) -> SessionConfig {
        SessionConfig {
            tick_interval_ms: 0,
            max_ticks,
        }
    }

    fn session(temperatures: &[f64]) -> StreamingSession<ScriptedSource> {
        StreamingSession::new(ScriptedSource::new(temperatures), classifier(), config(1000))
    }

    #[tokio::test]
    async fn test_tick_requires_running() {
        let mut s = session(&[90.0]);
        assert_eq!(s.state().phase, SessionPhase::Idle);
        assert!(s.tick().await.unwrap().is_none());
        assert_eq!(s.total_ticks(), 0);

        assert!(s.start());
        assert!(!s.start());
        let outcome = s.tick().await.unwrap().unwrap();
        assert_eq!(outcome.tick, 1);
        assert_eq!(outcome.severity, FaultSeverity::Normal);
        assert_eq!(outcome.message, "Engine operating normally.");
        assert_eq!(s.state().history.len(), 1);
    }

    #[tokio::test]
    async fn test_critical_stop_and_reset_cycle() {
        let mut s = session(&[90.0, 97.0, 115.0, 90.0]);
        s.start();

        assert_eq!(s.tick().await.unwrap().unwrap().severity, FaultSeverity::Normal);
        assert_eq!(s.tick().await.unwrap().unwrap().severity, FaultSeverity::Minor);
        let critical = s.tick().await.unwrap().unwrap();
        assert_eq!(critical.severity, FaultSeverity::Critical);
        assert!(critical.message.starts_with("CRITICAL FAULT!"));

        assert_eq!(s.state().phase, SessionPhase::StoppedCritical);
        assert_eq!(s.state().stop_reason.as_deref(), Some(CRITICAL_STOP_REASON));
        assert!(!s.state().is_active());

        // Absorbing until reset
        assert!(s.tick().await.unwrap().is_none());
        assert!(s.tick().await.unwrap().is_none());
        assert_eq!(s.total_ticks(), 3);
        assert_eq!(s.state().history.len(), 3);

        assert!(s.reset());
        assert_eq!(s.state().phase, SessionPhase::Running);
        assert!(s.state().stop_reason.is_none());
        assert!(s.state().history.is_empty());

        let next = s.tick().await.unwrap().unwrap();
        assert_eq!(next.tick, 1);
        assert_eq!(next.severity, FaultSeverity::Normal);
    }

    #[tokio::test]
    async fn test_reset_outside_critical_is_noop() {
        let mut s = session(&[90.0]);
        assert!(!s.reset());
        assert_eq!(s.state().phase, SessionPhase::Idle);

        s.start();
        s.tick().await.unwrap();
        assert!(!s.reset());
        assert_eq!(s.state().phase, SessionPhase::Running);
        assert_eq!(s.state().history.len(), 1);
    }

    #[tokio::test]
    async fn test_stop_does_not_clear_critical() {
        let mut s = session(&[120.0]);
        s.start();
        s.tick().await.unwrap();
        s.stop();
        assert_eq!(s.state().phase, SessionPhase::StoppedCritical);
    }

    #[tokio::test]
    async fn test_history_keeps_latest_five() {
        let temps = [80.0, 81.0, 82.0, 83.0, 84.0, 85.0, 86.0];
        let mut s = session(&temps);
        s.start();
        for _ in 0..temps.len() {
            s.tick().await.unwrap();
        }

        let kept: Vec<f64> = s.state().history.iter().map(|e| e.temperature).collect();
        assert_eq!(kept, vec![82.0, 83.0, 84.0, 85.0, 86.0]);
    }

    #[tokio::test]
    async fn test_run_honours_tick_ceiling() {
        let mut s = StreamingSession::new(ScriptedSource::new(&[90.0]), classifier(), config(3));
        let (_tx, rx) = broadcast::channel(1);

        let summary = s.run(rx).await.unwrap();
        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.final_phase, SessionPhase::Idle);
        assert_eq!(summary.highest_severity, Some(FaultSeverity::Normal));
    }

    #[tokio::test]
    async fn test_zero_ceiling_never_pulls() {
        let mut s = StreamingSession::new(ScriptedSource::new(&[90.0]), classifier(), config(0));
        let (_tx, rx) = broadcast::channel(1);

        let summary = s.run(rx).await.unwrap();
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.final_phase, SessionPhase::Idle);
        assert_eq!(s.total_ticks(), 0);
        assert_eq!(s.source().temperatures.len(), 1);
    }

    #[tokio::test]
    async fn test_closed_shutdown_channel_keeps_running() {
        let mut s = StreamingSession::new(ScriptedSource::new(&[90.0]), classifier(), config(4));
        let (tx, rx) = broadcast::channel::<()>(1);
        drop(tx);

        let summary = s.run(rx).await.unwrap();
        assert_eq!(summary.ticks, 4);
        assert_eq!(summary.final_phase, SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_run_halts_on_critical() {
        let mut s = session(&[90.0, 105.0, 115.0, 90.0]);
        let (tx, rx) = broadcast::channel(1);

        let summary = s.run(rx).await.unwrap();
        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.final_phase, SessionPhase::StoppedCritical);
        assert_eq!(summary.highest_severity, Some(FaultSeverity::Critical));

        // Running again without reset does nothing
        let again = s.run(tx.subscribe()).await.unwrap();
        assert_eq!(again.ticks, 0);
        assert_eq!(s.total_ticks(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let mut cfg = config(1000);
        cfg.tick_interval_ms = 2000;
        let mut s = StreamingSession::new(ScriptedSource::new(&[90.0]), classifier(), cfg);

        let (tx, rx) = broadcast::channel(1);
        tx.send(()).unwrap();

        let summary = s.run(rx).await.unwrap();
        assert!(summary.ticks <= 1);
        assert_eq!(summary.final_phase, SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_log_failure_does_not_abort_tick() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be appended to
        let mut s = session(&[97.0]).with_log(MaintenanceLog::new(dir.path()));
        s.start();

        let outcome = s.tick().await.unwrap().unwrap();
        assert_eq!(outcome.severity, FaultSeverity::Minor);
        assert!(outcome.log_error.is_some());
        assert_eq!(s.state().history.len(), 1);
    }

    #[tokio::test]
    async fn test_ticks_are_logged() {
        let dir = tempfile::tempdir().unwrap();
        let log = MaintenanceLog::new(dir.path().join("log.csv"));
        let mut s = session(&[90.0, 105.0]).with_log(log.clone());
        s.start();
        s.tick().await.unwrap();
        s.tick().await.unwrap();

        let summary = log.summary().unwrap();
        assert_eq!(summary.entries.len(), 2);
        assert_eq!(summary.entries[1].severity, FaultSeverity::Major);
        assert_eq!(summary.entries[1].dataset_row, None);
    }

    #[tokio::test]
    async fn test_events_published() {
        let bus = Arc::new(EventBus::new(16));
        let mut rx = bus.subscribe();
        let mut s = session(&[115.0]).with_events(bus.clone());

        s.start();
        s.tick().await.unwrap();

        assert!(matches!(rx.recv().await.unwrap().payload, SessionEvent::Started { .. }));
        match rx.recv().await.unwrap().payload {
            SessionEvent::Tick { session_id, outcome } => {
                assert_eq!(session_id, s.id());
                assert_eq!(outcome.severity, FaultSeverity::Critical);
            }
            other => panic!("unexpected event {:?}", other),
        }
        match rx.recv().await.unwrap().payload {
            SessionEvent::StoppedCritical { reason, .. } => assert_eq!(reason, CRITICAL_STOP_REASON),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_independent_simulated_sessions() {
        let mut a = StreamingSession::new(EngineSimulator::with_seed(11), classifier(), config(10));
        let mut b = StreamingSession::new(EngineSimulator::with_seed(11), classifier(), config(10));
        a.start();
        b.start();

        for _ in 0..10 {
            let ra = a.tick().await.unwrap().map(|o| o.reading);
            let rb = b.tick().await.unwrap().map(|o| o.reading);
            assert_eq!(ra, rb);
        }
        assert_eq!(a.source().state().tick, b.source().state().tick);
    }
}
