//! Health Verdict Model

use serde::{Deserialize, Serialize};

/// Overall health classification for a subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    #[default]
    Normal,
    Warning,
    Critical,
}

/// Machine-readable fault identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultCode {
    /// Spill control valve hunting around its setpoint
    ScvSticking,
    /// Injector feedback pegged outside the critical band
    InjectorRisk,
}

/// One out-of-band cylinder observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectorAlert {
    /// Cylinder number (1-based)
    pub cylinder: u8,
    /// Measured feedback (mm³/stroke)
    pub value: f64,
    /// Human-readable description
    pub message: String,
}

/// Verdict produced per frame by an analyzer.
///
/// Produced fresh for every processed frame and never mutated afterwards;
/// consumed by the presentation layer and discarded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiagnosticStatus {
    /// Health classification
    pub status: HealthStatus,
    /// Fault identifier when not NORMAL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<FaultCode>,
    /// Human-readable headline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Supporting detail (measured value vs. limit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Per-cylinder alerts (injector analysis only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<InjectorAlert>,
}

impl DiagnosticStatus {
    /// Healthy verdict with no further detail
    pub fn normal() -> Self {
        Self::default()
    }

    /// True unless the verdict is NORMAL
    pub fn is_fault(&self) -> bool {
        self.status != HealthStatus::Normal
    }
}
