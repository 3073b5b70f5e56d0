//! Diagnostic Enforcer Implementation

use crate::report::{DecodedValues, DiagnosticReport, SystemAnalysis};
use fault_analysis::{analyze_injectors, analyze_rail_pressure};
use mode21_codec::{injector_feedback_mm3, rail_pressure_kpa, Mode21Frame, CYLINDER_COUNT};
use rolling_buffer::RollingBuffer;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use vehicle_profile::VehicleProfile;

/// PID id carrying the per-vehicle injector calibration constant
const INJECTOR_PID: &str = "injector_feedback";

/// Per-session diagnostic pipeline.
///
/// Owns the rail pressure history exclusively; construct one enforcer per
/// active connection and never share it. Frames are processed serially on a
/// single timeline, so no locking is involved.
pub struct DiagnosticEnforcer {
    /// Active vehicle configuration
    profile: VehicleProfile,
    /// Recent rail pressure samples (arrival order)
    rail_history: RollingBuffer,
    /// Injector calibration constant, cached from the profile
    correction_factor: f64,
}

impl DiagnosticEnforcer {
    /// Create an enforcer for the given vehicle with the default 50-sample
    /// rail pressure window
    pub fn new(profile: VehicleProfile) -> Self {
        Self::with_history_capacity(profile, rolling_buffer::DEFAULT_CAPACITY)
    }

    /// Create an enforcer with an explicit history window size
    pub fn with_history_capacity(profile: VehicleProfile, capacity: usize) -> Self {
        let correction_factor = profile.correction_factor(INJECTOR_PID);
        debug!(
            vehicle = %profile.vehicle_name,
            capacity,
            correction_factor,
            "diagnostic enforcer created"
        );
        Self {
            profile,
            rail_history: RollingBuffer::new(capacity),
            correction_factor,
        }
    }

    /// The active vehicle profile
    pub fn profile(&self) -> &VehicleProfile {
        &self.profile
    }

    /// Number of rail pressure samples currently buffered
    pub fn history_len(&self) -> usize {
        self.rail_history.len()
    }

    /// Process one raw frame into a combined values-plus-analysis report.
    ///
    /// Missing payload bytes decode as 0 and config-driven PIDs with
    /// non-finite formula results decode as 0.0; a single bad field never
    /// aborts the rest of the frame or the stream.
    pub fn process(&mut self, frame: &Mode21Frame) -> DiagnosticReport {
        // 1. Decode the fixed Mode 21 payload
        let (byte_a, byte_b) = frame.rail_pressure_bytes();
        let rail_pressure = rail_pressure_kpa(byte_a, byte_b);

        let mut injectors = [0.0; CYLINDER_COUNT];
        for (index, value) in injectors.iter_mut().enumerate() {
            *value = injector_feedback_mm3(frame.injector_byte(index), self.correction_factor);
        }

        // 2. Buffer rail pressure (oldest sample evicted at capacity)
        self.rail_history.push(rail_pressure);

        // 3. Decode config-driven channels through profile formulas
        let extra = self.decode_extended(frame);

        // 4. Analyze
        let thresholds = self.profile.thresholds();
        let rail_system =
            analyze_rail_pressure(rail_pressure, &self.rail_history, &thresholds.rail_pressure);
        let fuel_system = analyze_injectors(&injectors, &thresholds.injector_feedback);

        DiagnosticReport {
            timestamp_ms: frame.timestamp_ms,
            values: DecodedValues {
                rail_pressure_kpa: rail_pressure,
                injectors_mm3: injectors,
                extra,
            },
            analysis: SystemAnalysis {
                rail_system,
                fuel_system,
            },
        }
    }

    fn decode_extended(&self, frame: &Mode21Frame) -> BTreeMap<String, f64> {
        let mut extra = BTreeMap::new();
        for (id, bytes) in &frame.extended {
            let Some(formula) = self.profile.formula(id) else {
                debug!(pid = %id, "no formula for extended PID, skipping");
                continue;
            };
            let value = formula.eval(*bytes);
            if value.is_finite() {
                extra.insert(id.clone(), value);
            } else {
                warn!(pid = %id, formula = formula.source(), "non-finite formula result, using 0");
                extra.insert(id.clone(), 0.0);
            }
        }
        extra
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fault_analysis::HealthStatus;
    use mode21_codec::RawBytes;

    fn vigo() -> VehicleProfile {
        VehicleProfile::builtin("toyota_vigo_champ").unwrap()
    }

    /// Frame with rail pressure encoded from kPa and nominal injectors
    fn frame(timestamp_ms: u64, rail_kpa: u16, injectors: [u8; 4]) -> Mode21Frame {
        let mut frame = Mode21Frame::new(timestamp_ms);
        frame.rail_pressure_a = Some((rail_kpa >> 8) as u8);
        frame.rail_pressure_b = Some((rail_kpa & 0xFF) as u8);
        frame.injectors = injectors.map(Some);
        frame
    }

    #[test]
    fn test_decode_values() {
        let mut enforcer = DiagnosticEnforcer::new(vigo());
        let report = enforcer.process(&frame(1000, 35000, [128, 130, 126, 128]));

        assert_eq!(report.timestamp_ms, 1000);
        assert_eq!(report.values.rail_pressure_kpa, 35000.0);
        assert_eq!(report.values.injectors_mm3, [0.0, 2.0, -2.0, 0.0]);
    }

    #[test]
    fn test_steady_stream_stays_normal() {
        let mut enforcer = DiagnosticEnforcer::new(vigo());

        // Fill the whole window with pressures fluctuating within +/- 500 kPa
        let mut last = None;
        for i in 0..60u64 {
            let kpa = 35000 + ((i % 7) as u16) * 140;
            last = Some(enforcer.process(&frame(i * 100, kpa, [128; 4])));
        }

        let report = last.unwrap();
        assert_eq!(enforcer.history_len(), 50);
        assert_eq!(report.analysis.rail_system.status, HealthStatus::Normal);
        assert_eq!(report.analysis.fuel_system.status, HealthStatus::Normal);
    }

    #[test]
    fn test_injector_fault_flags_cylinder_3() {
        let mut enforcer = DiagnosticEnforcer::new(vigo());
        for i in 0..20u64 {
            enforcer.process(&frame(i * 100, 35000, [128; 4]));
        }

        // Cylinder 3 decoded value (120-128)*1.0 = -8.0, outside [-3, 3]
        let report = enforcer.process(&frame(2100, 35000, [128, 128, 120, 128]));

        let fuel = &report.analysis.fuel_system;
        assert_eq!(fuel.status, HealthStatus::Critical);
        assert_eq!(fuel.alerts.len(), 1);
        assert_eq!(fuel.alerts[0].cylinder, 3);
        assert_eq!(fuel.alerts[0].value, -8.0);
        // The next clean frame recovers immediately (no hysteresis)
        let report = enforcer.process(&frame(2200, 35000, [128; 4]));
        assert_eq!(report.analysis.fuel_system.status, HealthStatus::Normal);
    }

    #[test]
    fn test_hunting_pressure_flags_scv() {
        let mut enforcer = DiagnosticEnforcer::new(vigo());

        // Sinusoidal surge of +/- 5000 kPa, well past the 3000 kPa limit
        let mut last = None;
        for i in 0..30u64 {
            let kpa = (35000.0 + 5000.0 * (i as f64 * 0.2).sin()) as u16;
            last = Some(enforcer.process(&frame(i * 100, kpa, [128; 4])));
        }

        let rail = last.unwrap().analysis.rail_system;
        assert_eq!(rail.status, HealthStatus::Warning);
        assert!(rail.detail.unwrap().contains("Limit: 3000"));
    }

    #[test]
    fn test_missing_bytes_do_not_stall_the_stream() {
        let mut enforcer = DiagnosticEnforcer::new(vigo());

        let report = enforcer.process(&Mode21Frame::new(0));
        assert_eq!(report.values.rail_pressure_kpa, 0.0);
        assert_eq!(report.values.injectors_mm3, [-128.0; 4]);

        // Stream continues: next complete frame processes normally
        let report = enforcer.process(&frame(100, 35000, [128; 4]));
        assert_eq!(report.values.rail_pressure_kpa, 35000.0);
        assert_eq!(enforcer.history_len(), 2);
    }

    #[test]
    fn test_extended_pids_flow_through_formulas() {
        let profile = VehicleProfile::builtin("isuzu_dmax").unwrap();
        let mut enforcer = DiagnosticEnforcer::new(profile);

        let mut input = frame(500, 35000, [128; 4]);
        // trans_temp: A-40, coolant_temp (Isuzu): B-40
        input.extended.insert("trans_temp".into(), RawBytes::from_a(118));
        input
            .extended
            .insert("coolant_temp".into(), RawBytes::from_ab(0, 125));
        input
            .extended
            .insert("unknown_pid".into(), RawBytes::from_a(1));

        let report = enforcer.process(&input);
        assert_eq!(report.values.extra.get("trans_temp"), Some(&78.0));
        assert_eq!(report.values.extra.get("coolant_temp"), Some(&85.0));
        // PIDs without a profile formula are skipped, not fatal
        assert!(!report.values.extra.contains_key("unknown_pid"));
    }

    #[test]
    fn test_simulated_faults_surface_through_the_pipeline() {
        use signal_sim::{FaultFrameGenerator, FaultMode};

        let mut enforcer = DiagnosticEnforcer::new(vigo());
        let mut generator = FaultFrameGenerator::with_seed(17);

        // Normal telemetry settles to a clean bill of health
        let mut report = None;
        for i in 0..60u64 {
            report = Some(enforcer.process(&generator.next_frame(i * 100)));
        }
        let report = report.unwrap();
        assert_eq!(report.analysis.rail_system.status, HealthStatus::Normal);
        assert_eq!(report.analysis.fuel_system.status, HealthStatus::Normal);

        // A pinned injector is critical on the very next frame
        generator.set_mode(FaultMode::InjectorFault);
        let report = enforcer.process(&generator.next_frame(6100));
        let fuel = &report.analysis.fuel_system;
        assert_eq!(fuel.status, HealthStatus::Critical);
        assert_eq!(fuel.alerts[0].cylinder, 3);

        // SCV hunting needs the history window to fill with surge samples
        generator.set_mode(FaultMode::ScvFault);
        let mut tripped = false;
        for i in 0..100u64 {
            let report = enforcer.process(&generator.next_frame(7000 + i * 100));
            if report.analysis.rail_system.status == HealthStatus::Warning {
                tripped = true;
                break;
            }
        }
        assert!(tripped, "SCV fault never produced a warning");
    }

    #[test]
    fn test_report_serializes_for_presentation() {
        let mut enforcer = DiagnosticEnforcer::new(vigo());
        let report = enforcer.process(&frame(42, 35000, [128, 128, 120, 128]));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["values"]["railPressureKpa"], serde_json::json!(35000.0));
        assert_eq!(json["analysis"]["fuelSystem"]["status"], "CRITICAL");
    }
}
