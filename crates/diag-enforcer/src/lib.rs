//! Diagnostic Enforcer
//!
//! The single aggregation point of the pipeline: given one raw Mode 21
//! frame, decode physical values, maintain the rail pressure history, run
//! the fault analyzers, and emit one combined report for presentation.

mod enforcer;
mod report;

pub use enforcer::DiagnosticEnforcer;
pub use report::{DecodedValues, DiagnosticReport, SystemAnalysis};
