// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! Event bus between monitoring sessions and display subscribers

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::TickOutcome;

/// What happened in a session
#[derive(Debug, Clone, Serialize)]
pub enum SessionEvent {
    Started { session_id: Uuid },
    Tick { session_id: Uuid, outcome: TickOutcome },
    StoppedCritical { session_id: Uuid, reason: String },
    Reset { session_id: Uuid },
    Finished { session_id: Uuid, ticks: u64 },
}

/// Event envelope
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: SessionEvent,
}

/// Broadcast channel for session events.
///
/// Publishing never blocks; with no subscribers events are dropped.
pub struct EventBus {
    event_tx: broadcast::Sender<Event>,
    event_counter: AtomicU64,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            event_tx,
            event_counter: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, payload: SessionEvent) {
        let id = self.event_counter.fetch_add(1, Ordering::Relaxed);
        let event = Event {
            id,
            timestamp: Utc::now(),
            payload,
        };
        let _ = self.event_tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Events published so far
    pub fn published(&self) -> u64 {
        self.event_counter.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
