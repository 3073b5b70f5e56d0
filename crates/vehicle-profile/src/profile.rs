//! Vehicle Profile Schema and Loading

use crate::error::ProfileError;
use mode21_codec::Formula;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Functional broadcast address used when a PID does not name its own header
pub const DEFAULT_ADDRESS: &str = "7DF";

/// One pollable parameter: identifier, addressing header, decode formula,
/// and an optional per-vehicle calibration constant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PidSpec {
    /// PID identifier, e.g. "rail_pressure" or "trans_temp"
    pub id: String,
    /// CAN request header for this PID (e.g. "7E2" for the transmission ECU)
    #[serde(default = "default_address")]
    pub address: String,
    /// Decode formula over response bytes A-D, e.g. "A*256+B"
    pub formula: String,
    /// Calibration constant applied on top of the formula result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction_factor: Option<f64>,
}

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

/// Rail pressure fault limits
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RailPressureLimits {
    /// Peak-to-peak/2 amplitude (kPa) above which the SCV is considered sticking
    pub scv_sticking_fluctuation: f64,
}

/// Injector feedback fault limits
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InjectorLimits {
    /// Lowest acceptable feedback (mm³/stroke)
    pub critical_min: f64,
    /// Highest acceptable feedback (mm³/stroke)
    pub critical_max: f64,
}

/// Threshold constants consumed by the fault analyzers
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    pub rail_pressure: RailPressureLimits,
    pub injector_feedback: InjectorLimits,
}

/// Static configuration for one vehicle model.
///
/// Loaded once at connection time; formulas are compiled during load so a
/// malformed profile is rejected before any frame is processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleProfile {
    /// Human-readable model name
    pub vehicle_name: String,
    /// Parameters this vehicle exposes
    pub pids: Vec<PidSpec>,
    /// Fault thresholds for this model
    pub thresholds: Thresholds,
    /// Compiled formulas keyed by PID id
    #[serde(skip)]
    formulas: HashMap<String, Formula>,
}

impl VehicleProfile {
    /// Parse a profile from JSON text and compile its formulas
    pub fn from_json_str(json: &str) -> Result<Self, ProfileError> {
        let mut profile: VehicleProfile = serde_json::from_str(json)?;
        profile.compile()?;
        info!(
            vehicle = %profile.vehicle_name,
            pids = profile.pids.len(),
            "vehicle profile loaded"
        );
        Ok(profile)
    }

    /// Load a profile from a JSON file on disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Load a builtin profile by name ("toyota_vigo_champ" or "isuzu_dmax")
    pub fn builtin(name: &str) -> Result<Self, ProfileError> {
        let json = match name {
            "toyota_vigo_champ" => include_str!("../profiles/toyota_vigo_champ.json"),
            "isuzu_dmax" => include_str!("../profiles/isuzu_dmax.json"),
            other => return Err(ProfileError::UnknownBuiltin(other.to_string())),
        };
        Self::from_json_str(json)
    }

    /// Compile every PID formula, rejecting duplicates and malformed expressions
    fn compile(&mut self) -> Result<(), ProfileError> {
        let mut formulas = HashMap::with_capacity(self.pids.len());
        for pid in &self.pids {
            let formula =
                Formula::parse(&pid.formula).map_err(|source| ProfileError::InvalidFormula {
                    pid: pid.id.clone(),
                    source,
                })?;
            if formulas.insert(pid.id.clone(), formula).is_some() {
                return Err(ProfileError::DuplicatePid(pid.id.clone()));
            }
        }
        self.formulas = formulas;
        Ok(())
    }

    /// Look up a PID spec by id
    pub fn pid(&self, id: &str) -> Option<&PidSpec> {
        self.pids.iter().find(|p| p.id == id)
    }

    /// Compiled formula for a PID id
    pub fn formula(&self, id: &str) -> Option<&Formula> {
        self.formulas.get(id)
    }

    /// Correction factor for a PID, 1.0 when absent
    pub fn correction_factor(&self, id: &str) -> f64 {
        self.pid(id).and_then(|p| p.correction_factor).unwrap_or(1.0)
    }

    /// Fault thresholds for this model
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mode21_codec::RawBytes;

    #[test]
    fn test_builtin_profiles_load_and_compile() {
        let vigo = VehicleProfile::builtin("toyota_vigo_champ").unwrap();
        assert_eq!(vigo.vehicle_name, "Toyota Vigo Champ");
        assert!(vigo.formula("rail_pressure").is_some());
        assert_eq!(vigo.correction_factor("injector_feedback"), 1.0);

        let dmax = VehicleProfile::builtin("isuzu_dmax").unwrap();
        let trans = dmax.pid("trans_temp").unwrap();
        assert_eq!(trans.address, "7E2");
        // ATF temp formula: byte 125 -> 85°C
        let formula = dmax.formula("trans_temp").unwrap();
        assert_eq!(formula.eval(RawBytes::from_a(125)), 85.0);
    }

    #[test]
    fn test_unknown_builtin_rejected() {
        assert!(matches!(
            VehicleProfile::builtin("ford_ranger"),
            Err(ProfileError::UnknownBuiltin(_))
        ));
    }

    #[test]
    fn test_address_defaults_to_broadcast() {
        let json = r#"{
            "vehicleName": "Test",
            "pids": [{ "id": "coolant_temp", "formula": "A-40" }],
            "thresholds": {
                "rail_pressure": { "scv_sticking_fluctuation": 3000.0 },
                "injector_feedback": { "critical_min": -3.0, "critical_max": 3.0 }
            }
        }"#;
        let profile = VehicleProfile::from_json_str(json).unwrap();
        assert_eq!(profile.pid("coolant_temp").unwrap().address, DEFAULT_ADDRESS);
        assert_eq!(profile.correction_factor("coolant_temp"), 1.0);
    }

    #[test]
    fn test_malformed_formula_rejected_at_load() {
        let json = r#"{
            "vehicleName": "Broken",
            "pids": [{ "id": "bad", "formula": "eval(A)" }],
            "thresholds": {
                "rail_pressure": { "scv_sticking_fluctuation": 3000.0 },
                "injector_feedback": { "critical_min": -3.0, "critical_max": 3.0 }
            }
        }"#;
        match VehicleProfile::from_json_str(json) {
            Err(ProfileError::InvalidFormula { pid, .. }) => assert_eq!(pid, "bad"),
            other => panic!("expected InvalidFormula, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_pid_rejected() {
        let json = r#"{
            "vehicleName": "Dup",
            "pids": [
                { "id": "rpm", "formula": "A" },
                { "id": "rpm", "formula": "B" }
            ],
            "thresholds": {
                "rail_pressure": { "scv_sticking_fluctuation": 3000.0 },
                "injector_feedback": { "critical_min": -3.0, "critical_max": 3.0 }
            }
        }"#;
        assert!(matches!(
            VehicleProfile::from_json_str(json),
            Err(ProfileError::DuplicatePid(_))
        ));
    }
}
