//! Mode 21 Frame Codec
//!
//! This crate provides the raw frame model for manufacturer-specific
//! Mode 21 sensor payloads, the byte-to-physical-unit decoders for the
//! common-rail fuel system, and a constrained arithmetic formula
//! evaluator for config-driven PIDs.

mod error;
mod formula;
mod frame;
mod parsers;

pub use error::FormulaError;
pub use formula::Formula;
pub use frame::{Mode21Frame, RawBytes};
pub use parsers::{
    engine_rpm, injector_feedback_mm3, rail_pressure_kpa, temperature_c, vehicle_speed_kmh,
};

/// OBD-II service/mode constants
pub mod mode {
    /// Current data
    pub const CURRENT_DATA: u8 = 0x01;
    /// Manufacturer-specific extended data (injector/rail feedback)
    pub const EXTENDED_DATA: u8 = 0x21;
}

/// Number of cylinders reporting injector feedback
pub const CYLINDER_COUNT: usize = 4;
