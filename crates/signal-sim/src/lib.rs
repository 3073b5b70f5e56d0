//! Signal Simulator
//!
//! Generates physically plausible synthetic telemetry when no real adapter
//! is attached, exercising the same downstream pipeline as a live vehicle.
//! Three pieces: a free-running drive-state engine, a fault-injecting raw
//! frame generator, and a timer-driven transport stand-in.

mod engine;
mod error;
mod fault;
mod transport;

pub use engine::{DriveState, EngineSnapshot, SimulationEngine, SMOOTHING_FACTOR};
pub use error::TransportError;
pub use fault::{encode_ambient_channels, FaultFrameGenerator, FaultMode};
pub use transport::{SimTransport, TransportConfig};
