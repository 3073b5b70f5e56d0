//! Drive-State Simulation Engine
//!
//! Free-running model of a diesel pickup being driven: four drive states
//! with target rpm/speed/rail-pressure, exponential smoothing toward the
//! active targets, and small independent noise per channel. Explicit
//! instance with an owned RNG so multiple simulated sessions can coexist.

use mode21_codec::CYLINDER_COUNT;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fraction of the distance to target covered per update tick
pub const SMOOTHING_FACTOR: f64 = 0.05;

/// Chance of jumping to a random drive state on each transition check
const STATE_CHANGE_PROBABILITY: f64 = 0.2;

/// Coolant operating band (°C); the simulation clamps into this range
const COOLANT_BAND_C: (f64, f64) = (80.0, 95.0);

/// Per-channel noise magnitudes (peak-to-peak)
const RPM_NOISE: f64 = 50.0;
const SPEED_NOISE: f64 = 1.0;
const RAIL_NOISE: f64 = 500.0;
const COOLANT_NOISE: f64 = 0.05;
const TRANS_NOISE: f64 = 0.04;
const INJECTOR_NOISE: f64 = 0.5;

/// Driving mode of the simulated vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriveState {
    #[default]
    Idle,
    Accelerating,
    Cruising,
    Decelerating,
}

impl DriveState {
    const ALL: [DriveState; 4] = [
        DriveState::Idle,
        DriveState::Accelerating,
        DriveState::Cruising,
        DriveState::Decelerating,
    ];

    /// Target values the channels smooth toward in this state
    fn targets(self) -> Targets {
        match self {
            DriveState::Idle => Targets {
                rpm: 800.0,
                speed_kmh: 0.0,
                rail_pressure_kpa: 35_000.0,
            },
            DriveState::Accelerating => Targets {
                rpm: 3000.0,
                speed_kmh: 100.0,
                rail_pressure_kpa: 160_000.0,
            },
            DriveState::Cruising => Targets {
                rpm: 2000.0,
                speed_kmh: 90.0,
                rail_pressure_kpa: 120_000.0,
            },
            DriveState::Decelerating => Targets {
                rpm: 1000.0,
                speed_kmh: 40.0,
                rail_pressure_kpa: 40_000.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Targets {
    rpm: f64,
    speed_kmh: f64,
    rail_pressure_kpa: f64,
}

/// One tick's worth of simulated physical values
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EngineSnapshot {
    /// Active drive state
    pub state: DriveState,
    /// Engine speed (rpm)
    pub rpm: f64,
    /// Vehicle speed (km/h)
    pub speed_kmh: f64,
    /// Coolant temperature (°C)
    pub coolant_temp_c: f64,
    /// Transmission fluid temperature (°C)
    pub trans_temp_c: f64,
    /// Common rail pressure (kPa)
    pub rail_pressure_kpa: f64,
    /// Injector feedback per cylinder (mm³/stroke)
    pub injectors_mm3: [f64; CYLINDER_COUNT],
}

/// Free-running drive simulation.
///
/// Call [`maybe_transition`](Self::maybe_transition) on the slow cadence
/// (every ~2 s) and [`update`](Self::update) on every poll tick (10 Hz).
pub struct SimulationEngine {
    state: DriveState,
    rpm: f64,
    speed_kmh: f64,
    coolant_temp_c: f64,
    trans_temp_c: f64,
    rail_pressure_kpa: f64,
    injectors_mm3: [f64; CYLINDER_COUNT],
    rng: StdRng,
}

impl SimulationEngine {
    /// Create an engine idling at operating temperature
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create an engine with a fixed RNG seed for deterministic tests
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            state: DriveState::Idle,
            rpm: 800.0,
            speed_kmh: 0.0,
            coolant_temp_c: 85.0,
            trans_temp_c: 78.0,
            rail_pressure_kpa: 35_000.0,
            injectors_mm3: [0.0; CYLINDER_COUNT],
            rng,
        }
    }

    /// Current drive state
    pub fn state(&self) -> DriveState {
        self.state
    }

    /// Possibly jump to a uniformly random drive state.
    ///
    /// Called on the slow cadence; with probability ~20% the state changes,
    /// otherwise it stays. Transitions are probabilistic, not caller-driven.
    pub fn maybe_transition(&mut self) -> DriveState {
        if self.rng.gen::<f64>() < STATE_CHANGE_PROBABILITY {
            let next = DriveState::ALL[self.rng.gen_range(0..DriveState::ALL.len())];
            if next != self.state {
                debug!(from = ?self.state, to = ?next, "drive state transition");
            }
            self.state = next;
        }
        self.state
    }

    /// Advance one tick: smooth every channel toward its target and apply
    /// per-channel noise. Returns the resulting snapshot.
    pub fn update(&mut self) -> EngineSnapshot {
        let targets = self.state.targets();

        self.rpm += (targets.rpm - self.rpm) * SMOOTHING_FACTOR + self.noise(RPM_NOISE);
        self.speed_kmh = (self.speed_kmh
            + (targets.speed_kmh - self.speed_kmh) * SMOOTHING_FACTOR
            + self.noise(SPEED_NOISE))
        .max(0.0);
        self.rail_pressure_kpa += (targets.rail_pressure_kpa - self.rail_pressure_kpa)
            * SMOOTHING_FACTOR
            + self.noise(RAIL_NOISE);

        // Temperatures wander slowly; coolant is thermostat-limited
        self.coolant_temp_c = (self.coolant_temp_c + self.noise(COOLANT_NOISE))
            .clamp(COOLANT_BAND_C.0, COOLANT_BAND_C.1);
        self.trans_temp_c += self.noise(TRANS_NOISE);

        for feedback in self.injectors_mm3.iter_mut() {
            *feedback = (self.rng.gen::<f64>() - 0.5) * INJECTOR_NOISE;
        }

        self.snapshot()
    }

    /// Current values without advancing the simulation
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            state: self.state,
            rpm: self.rpm,
            speed_kmh: self.speed_kmh,
            coolant_temp_c: self.coolant_temp_c,
            trans_temp_c: self.trans_temp_c,
            rail_pressure_kpa: self.rail_pressure_kpa,
            injectors_mm3: self.injectors_mm3,
        }
    }

    fn noise(&mut self, magnitude: f64) -> f64 {
        (self.rng.gen::<f64>() - 0.5) * magnitude
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::new()
    }
}
