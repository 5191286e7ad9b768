// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! Tick pacing for the monitoring loop

use std::time::Duration;

use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::debug;

/// Fixed-cadence timer between ticks.
///
/// A zero period disables pacing; the loop then only yields to the runtime.
pub struct Pacer {
    period: Duration,
    interval: Option<Interval>,
}

impl Pacer {
    pub fn new(period: Duration) -> Self {
        let interval = if period.is_zero() {
            None
        } else {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Some(timer)
        };
        debug!("Tick pacing set to {:?}", period);
        Self { period, interval }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Resolve at the next tick; the first call resolves immediately
    pub async fn wait(&mut self) {
        match self.interval.as_mut() {
            Some(timer) => {
                timer.tick().await;
            }
            None => tokio::task::yield_now().await,
        }
    }
}
