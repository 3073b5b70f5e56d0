//! Fault Analyzers
//!
//! Deterministic rule evaluators that turn decoded physical values (plus
//! short history) into health verdicts for the presentation layer.

mod injectors;
mod rail;
mod status;

pub use injectors::analyze_injectors;
pub use rail::{analyze_rail_pressure, MIN_HISTORY_SAMPLES};
pub use status::{DiagnosticStatus, FaultCode, HealthStatus, InjectorAlert};
