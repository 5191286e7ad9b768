// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! Bounded recent-tick history

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detection::FaultSeverity;
use crate::telemetry::OperationalMode;

/// Default number of ticks kept for display
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// Snapshot of one tick for the recent-history table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub rpm: u32,
    pub mode: OperationalMode,
    pub severity: FaultSeverity,
}

impl HistoryEntry {
    pub fn status(&self) -> &'static str {
        self.severity.label()
    }

    /// Wall-clock time as shown in the table
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// FIFO buffer that drops the oldest entry once full
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    capacity: usize,
    entries: VecDeque<HistoryEntry>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rpm: u32) -> HistoryEntry {
        HistoryEntry {
            timestamp: Utc::now(),
            temperature: 90.0,
            rpm,
            mode: OperationalMode::Idle,
            severity: FaultSeverity::Normal,
        }
    }

    #[test]
    fn test_keeps_latest_five_in_arrival_order() {
        let mut history = History::default();
        for rpm in 1..=7 {
            history.push(entry(rpm));
        }

        let kept: Vec<u32> = history.iter().map(|e| e.rpm).collect();
        assert_eq!(kept, vec![3, 4, 5, 6, 7]);
        assert_eq!(history.latest().map(|e| e.rpm), Some(7));
    }

    #[test]
    fn test_below_capacity_keeps_everything() {
        let mut history = History::new(5);
        history.push(entry(1));
        history.push(entry(2));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut history = History::default();
        history.push(entry(1));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn test_status_label() {
        assert_eq!(entry(1).status(), "Normal");
    }
}
