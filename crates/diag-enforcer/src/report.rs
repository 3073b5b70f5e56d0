//! Aggregated Report Model

use fault_analysis::DiagnosticStatus;
use mode21_codec::CYLINDER_COUNT;
use serde::Serialize;
use std::collections::BTreeMap;

/// Physical values decoded from one frame
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedValues {
    /// Common rail pressure (kPa)
    pub rail_pressure_kpa: f64,
    /// Injector feedback per cylinder, 1-4 (mm³/stroke)
    pub injectors_mm3: [f64; CYLINDER_COUNT],
    /// Formula-decoded config-driven channels, keyed by PID id
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, f64>,
}

/// Analyzer verdicts per subsystem
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemAnalysis {
    /// Rail pressure stability verdict
    pub rail_system: DiagnosticStatus,
    /// Injector feedback verdict
    pub fuel_system: DiagnosticStatus,
}

/// One frame's worth of decoded values and analysis.
///
/// This is the enforcer-to-presentation boundary object; produced fresh per
/// frame, never mutated after construction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    /// Timestamp of the source frame (Unix ms)
    pub timestamp_ms: u64,
    /// Decoded physical values
    pub values: DecodedValues,
    /// Health verdicts
    pub analysis: SystemAnalysis,
}
