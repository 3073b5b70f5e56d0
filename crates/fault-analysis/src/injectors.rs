//! Injector Feedback Analysis
//!
//! Injector feedback is a closed-loop fuel-trim correction. A cylinder
//! pegged at an extreme indicates a mechanical injector fault risking
//! piston damage, so a single out-of-band cylinder is CRITICAL immediately.
//! No hysteresis or averaging: worst case wins.

use crate::status::{DiagnosticStatus, FaultCode, HealthStatus, InjectorAlert};
use tracing::warn;
use vehicle_profile::InjectorLimits;

/// Classify per-cylinder injector feedback against the critical band.
///
/// `feedback_mm3[i]` is the decoded feedback for cylinder `i + 1`.
pub fn analyze_injectors(feedback_mm3: &[f64; 4], limits: &InjectorLimits) -> DiagnosticStatus {
    let mut alerts = Vec::new();

    for (index, &value) in feedback_mm3.iter().enumerate() {
        if value < limits.critical_min || value > limits.critical_max {
            let cylinder = (index + 1) as u8;
            warn!(cylinder, value, "injector feedback outside critical band");
            alerts.push(InjectorAlert {
                cylinder,
                value,
                message: format!("Cylinder {cylinder} Feedback Critical: {value:.2}"),
            });
        }
    }

    if alerts.is_empty() {
        return DiagnosticStatus::normal();
    }

    DiagnosticStatus {
        status: HealthStatus::Critical,
        code: Some(FaultCode::InjectorRisk),
        message: Some("Injector Failure Risk".to_string()),
        detail: None,
        alerts,
    }
}
