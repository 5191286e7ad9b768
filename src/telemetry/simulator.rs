// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/enginewatch-rs

//! Synthetic engine telemetry for demo/testing

use async_trait::async_trait;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};

use super::{round_to, OperationalMode, TelemetryReading, TelemetrySource, Vibration};

/// Ticks between operational mode changes
pub const MODE_PERIOD_TICKS: u64 = 20;

/// RPM never drops below this, whatever the noise does
pub const RPM_FLOOR: i64 = 700;

/// Warm-up target; above it temperature random-walks instead of climbing
pub const WARM_TEMPERATURE: f64 = 90.0;

const WARMUP_STEP: f64 = 0.5;
const STEADY_STATE_WALK: f64 = 0.2;
const START_TEMPERATURE: f64 = 25.0;

/// Mechanical power constant, P[kW] = T[Nm] * n[rpm] / 9550
const POWER_CONSTANT: f64 = 9550.0;

/// Mutable generator state, advanced exactly once per tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSimState {
    pub tick: u64,
    pub temperature: f64,
    pub mode: OperationalMode,
}

impl Default for EngineSimState {
    fn default() -> Self {
        Self {
            tick: 0,
            temperature: START_TEMPERATURE,
            mode: OperationalMode::Idle,
        }
    }
}

/// Stateful engine simulator.
///
/// Each instance owns its own state and random stream, so independent
/// sessions never share an engine.
pub struct EngineSimulator {
    state: EngineSimState,
    rng: ChaCha8Rng,
    seed: Option<u64>,
}

impl EngineSimulator {
    /// Simulator seeded from OS entropy
    pub fn new() -> Self {
        Self {
            state: EngineSimState::default(),
            rng: ChaCha8Rng::from_entropy(),
            seed: None,
        }
    }

    /// Reproducible simulator: same seed, same readings
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: EngineSimState::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Current generator state
    pub fn state(&self) -> &EngineSimState {
        &self.state
    }

    /// Restart the engine: fresh state and, when seeded, the same random stream again
    pub fn restart(&mut self) {
        self.state = EngineSimState::default();
        self.rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
    }

    /// Advance one tick and emit the reading for it
    pub fn step(&mut self) -> TelemetryReading {
        self.state.tick += 1;
        if self.state.tick % MODE_PERIOD_TICKS == 0 {
            self.state.mode = OperationalMode::ALL[self.rng.gen_range(0..OperationalMode::ALL.len())];
        }
        let mode = self.state.mode;

        let rpm = self.generate_rpm(mode);
        self.advance_temperature();

        let fuel_efficiency = match mode {
            OperationalMode::Idle => self.rng.gen_range(10.0..15.0),
            OperationalMode::Cruising => self.rng.gen_range(15.0..20.0),
            OperationalMode::HeavyLoad => self.rng.gen_range(5.0..10.0),
        };

        let torque = round_to(rpm as f64 * 0.1 + self.rng.gen_range(-10.0..10.0), 2);
        let power_output = round_to(torque * rpm as f64 / POWER_CONSTANT, 2);
        let vibration = self.generate_vibration(mode);

        TelemetryReading {
            temperature: round_to(self.state.temperature, 2),
            rpm,
            fuel_efficiency: round_to(fuel_efficiency, 2),
            torque,
            power_output,
            vibration,
            mode,
        }
    }

    fn generate_rpm(&mut self, mode: OperationalMode) -> u32 {
        let t = self.state.tick as f64;
        let rpm: i64 = match mode {
            OperationalMode::Idle => 800 + self.rng.gen_range(-50..=50),
            OperationalMode::Cruising => {
                2000 + (200.0 * (t / 5.0).sin()) as i64 + self.rng.gen_range(-50..=50)
            }
            OperationalMode::HeavyLoad => {
                3000 + (300.0 * (t / 4.0).sin()) as i64 + self.rng.gen_range(-100..=100)
            }
        };
        rpm.max(RPM_FLOOR) as u32
    }

    fn advance_temperature(&mut self) {
        if self.state.temperature < WARM_TEMPERATURE {
            self.state.temperature += WARMUP_STEP;
        } else {
            self.state.temperature += self.rng.gen_range(-STEADY_STATE_WALK..STEADY_STATE_WALK);
        }
    }

    fn generate_vibration(&mut self, mode: OperationalMode) -> Vibration {
        // (lateral range, vertical range); heavier load shakes harder and noisier
        let (lateral, vertical) = match mode {
            OperationalMode::Idle => (Uniform::new(0.1, 0.3), Uniform::new(0.2, 0.4)),
            OperationalMode::Cruising => (Uniform::new(0.2, 0.5), Uniform::new(0.3, 0.6)),
            OperationalMode::HeavyLoad => (Uniform::new(0.4, 0.8), Uniform::new(0.5, 1.2)),
        };

        let x = self.rng.sample(lateral);
        let y = self.rng.sample(lateral);
        let z = self.rng.sample(vertical);

        Vibration::new(round_to(x, 3), round_to(y, 3), round_to(z, 3))
    }
}

impl Default for EngineSimulator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TelemetrySource for EngineSimulator {
    fn name(&self) -> &str {
        "simulator"
    }

    async fn next_reading(&mut self) -> TelemetryReading {
        self.step()
    }
}
