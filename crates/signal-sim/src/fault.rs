//! Fault-Injecting Frame Generator
//!
//! Synthesizes raw byte-level Mode 21 frames under selectable fault
//! scenarios, so the frames round-trip through the same unit parsers a
//! real adapter response would. Distinct from the free-running drive
//! engine: this generator owns the diagnostic payload (rail pressure and
//! injector bytes) and its fault shapes.

use crate::engine::EngineSnapshot;
use mode21_codec::{Mode21Frame, RawBytes, CYLINDER_COUNT};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;
use vehicle_profile::VehicleProfile;

/// Rail pressure setpoint the generator oscillates around (kPa, idle)
const RAIL_BASELINE_KPA: f64 = 35_000.0;

/// Peak-to-peak noise in NORMAL mode (kPa)
const RAIL_NOISE_KPA: f64 = 1000.0;

/// Surge amplitude in SCV_FAULT mode (kPa)
const SCV_SURGE_KPA: f64 = 5000.0;

/// Angular step of the surge oscillation per tick
const SCV_SURGE_STEP: f64 = 0.2;

/// Injector byte at zero trim
const NOMINAL_INJECTOR_BYTE: u8 = 128;

/// Pinned byte for the faulted cylinder: decodes to -8.0 mm³/stroke at
/// correction factor 1.0, far outside any critical band
const FAULT_INJECTOR_BYTE: u8 = 120;

/// Cylinder pinned out-of-band in INJECTOR_FAULT mode (0-based index)
const FAULT_CYLINDER_INDEX: usize = 2;

/// Fault scenario selected by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultMode {
    /// Small symmetric noise around the pressure baseline
    #[default]
    Normal,
    /// Sinusoidal pressure surge emulating spill control valve hunting
    ScvFault,
    /// One cylinder's feedback pinned to a fixed out-of-band value
    InjectorFault,
}

/// Generator for raw diagnostic payload frames under a fault scenario.
pub struct FaultFrameGenerator {
    mode: FaultMode,
    tick: u64,
    rng: StdRng,
}

impl FaultFrameGenerator {
    /// Create a generator in NORMAL mode
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a generator with a fixed RNG seed for deterministic tests
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            mode: FaultMode::Normal,
            tick: 0,
            rng,
        }
    }

    /// Active fault scenario
    pub fn mode(&self) -> FaultMode {
        self.mode
    }

    /// Switch the fault scenario; takes effect on the next frame
    pub fn set_mode(&mut self, mode: FaultMode) {
        if mode != self.mode {
            debug!(from = ?self.mode, to = ?mode, "fault mode changed");
        }
        self.mode = mode;
    }

    /// Produce the next raw Mode 21 payload frame
    pub fn next_frame(&mut self, timestamp_ms: u64) -> Mode21Frame {
        self.tick += 1;

        let rail_kpa = match self.mode {
            FaultMode::Normal | FaultMode::InjectorFault => {
                RAIL_BASELINE_KPA + (self.rng.gen::<f64>() - 0.5) * RAIL_NOISE_KPA
            }
            FaultMode::ScvFault => {
                RAIL_BASELINE_KPA + (self.tick as f64 * SCV_SURGE_STEP).sin() * SCV_SURGE_KPA
            }
        };
        let rail_raw = rail_kpa.clamp(0.0, 65_535.0) as u16;

        let mut injectors = [Some(NOMINAL_INJECTOR_BYTE); CYLINDER_COUNT];
        if self.mode == FaultMode::InjectorFault {
            injectors[FAULT_CYLINDER_INDEX] = Some(FAULT_INJECTOR_BYTE);
        }

        Mode21Frame {
            timestamp_ms,
            rail_pressure_a: Some((rail_raw >> 8) as u8),
            rail_pressure_b: Some((rail_raw & 0xFF) as u8),
            injectors,
            extended: Default::default(),
        }
    }
}

impl Default for FaultFrameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode the drive engine's ambient channels into the frame's extended
/// PID responses, for every PID the profile defines.
///
/// Encodings invert the builtin profile formulas. Offset-temperature values
/// are mirrored into both the A and B slots so either single-byte formula
/// variant (`A-40` or `B-40`) decodes them.
pub fn encode_ambient_channels(
    frame: &mut Mode21Frame,
    snapshot: &EngineSnapshot,
    profile: &VehicleProfile,
) {
    for pid in &profile.pids {
        let bytes = match pid.id.as_str() {
            "rpm" => {
                let raw = (snapshot.rpm.clamp(0.0, 16_383.0) * 4.0) as u16;
                RawBytes::from_ab((raw >> 8) as u8, (raw & 0xFF) as u8)
            }
            "speed" => RawBytes::from_a(snapshot.speed_kmh.clamp(0.0, 255.0) as u8),
            "coolant_temp" => offset_temp_bytes(snapshot.coolant_temp_c),
            "trans_temp" => offset_temp_bytes(snapshot.trans_temp_c),
            _ => continue,
        };
        frame.extended.insert(pid.id.clone(), bytes);
    }
}

fn offset_temp_bytes(temp_c: f64) -> RawBytes {
    let byte = (temp_c + 40.0).clamp(0.0, 255.0) as u8;
    RawBytes::from_ab(byte, byte)
}
