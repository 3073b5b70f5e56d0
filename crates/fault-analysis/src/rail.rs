//! Rail Pressure Analysis
//!
//! A mechanically sticking spill control valve makes rail pressure hunt
//! around its setpoint instead of holding steady. Peak-to-peak amplitude
//! over a rolling window is a noise-tolerant proxy for that failure mode.

use crate::status::{DiagnosticStatus, FaultCode, HealthStatus};
use rolling_buffer::RollingBuffer;
use tracing::{debug, warn};
use vehicle_profile::RailPressureLimits;

/// Minimum history depth before fluctuation is meaningful
pub const MIN_HISTORY_SAMPLES: usize = 10;

/// Classify rail pressure stability over the recent history window.
///
/// Returns NORMAL until at least [`MIN_HISTORY_SAMPLES`] samples have
/// accumulated. The limit comparison is strictly greater-than: a fluctuation
/// exactly at the limit is still NORMAL.
pub fn analyze_rail_pressure(
    current_kpa: f64,
    history: &RollingBuffer,
    limits: &RailPressureLimits,
) -> DiagnosticStatus {
    if history.len() < MIN_HISTORY_SAMPLES {
        debug!(
            samples = history.len(),
            "rail pressure history too short, skipping fluctuation check"
        );
        return DiagnosticStatus::normal();
    }

    let fluctuation = history.fluctuation();
    let limit = limits.scv_sticking_fluctuation;

    if fluctuation > limit {
        warn!(
            current_kpa,
            fluctuation, limit, "SCV sticking fluctuation detected"
        );
        return DiagnosticStatus {
            status: HealthStatus::Warning,
            code: Some(FaultCode::ScvSticking),
            message: Some("SCV Sticking Detected".to_string()),
            detail: Some(format!(
                "Fluctuation: +/- {fluctuation:.0} kPa (Limit: {limit:.0})"
            )),
            alerts: Vec::new(),
        };
    }

    DiagnosticStatus::normal()
}
