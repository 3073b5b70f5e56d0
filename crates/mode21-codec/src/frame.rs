//! Raw Frame Model
//!
//! A `Mode21Frame` is the unit of transport input: one polling tick's worth
//! of raw response bytes. Frames are ephemeral; the enforcer consumes them
//! immediately and never retains them.

use crate::CYLINDER_COUNT;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Raw response byte tuple for a config-driven PID
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBytes {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
}

impl RawBytes {
    /// Tuple with only the A byte set
    pub fn from_a(a: u8) -> Self {
        Self {
            a,
            ..Default::default()
        }
    }

    /// Tuple with the A and B bytes set
    pub fn from_ab(a: u8, b: u8) -> Self {
        Self {
            a,
            b,
            ..Default::default()
        }
    }
}

/// One raw Mode 21 sensor frame as delivered by the transport.
///
/// Fixed payload fields are `Option<u8>`: a `None` models a byte the adapter
/// failed to deliver. Missing bytes decode as 0 so a single bad frame never
/// stalls the stream. Config-driven PIDs (temperatures, rpm, speed, ...)
/// ride in `extended`, keyed by PID id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mode21Frame {
    /// Timestamp when the frame was produced (Unix ms)
    pub timestamp_ms: u64,
    /// Rail pressure high byte
    pub rail_pressure_a: Option<u8>,
    /// Rail pressure low byte
    pub rail_pressure_b: Option<u8>,
    /// Injector feedback bytes, cylinders 1-4
    pub injectors: [Option<u8>; CYLINDER_COUNT],
    /// Config-driven PID responses, keyed by PID id
    pub extended: BTreeMap<String, RawBytes>,
}

impl Mode21Frame {
    /// Create an empty frame with the given timestamp
    pub fn new(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            ..Default::default()
        }
    }

    /// Rail pressure byte pair, substituting 0 for missing bytes
    pub fn rail_pressure_bytes(&self) -> (u8, u8) {
        let a = self.rail_pressure_a.unwrap_or_else(|| {
            warn!(timestamp_ms = self.timestamp_ms, "rail pressure byte A missing, using 0");
            0
        });
        let b = self.rail_pressure_b.unwrap_or_else(|| {
            warn!(timestamp_ms = self.timestamp_ms, "rail pressure byte B missing, using 0");
            0
        });
        (a, b)
    }

    /// Injector feedback byte for a 0-based cylinder index, 0 when missing
    pub fn injector_byte(&self, index: usize) -> u8 {
        match self.injectors.get(index).copied().flatten() {
            Some(byte) => byte,
            None => {
                warn!(
                    timestamp_ms = self.timestamp_ms,
                    cylinder = index + 1,
                    "injector feedback byte missing, using 0"
                );
                0
            }
        }
    }
}
