//! Application Settings

use serde::Deserialize;
use signal_sim::FaultMode;

/// Runtime configuration for the monitor.
///
/// Loaded from an optional `diagmon.toml` next to the binary, overridable
/// via `DIAGMON_*` environment variables (e.g. `DIAGMON_FAULT_MODE=SCV_FAULT`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Builtin profile name or path to a profile JSON file
    pub profile: String,
    /// Fault scenario for the simulated transport
    pub fault_mode: FaultMode,
    /// Polling tick interval in milliseconds
    pub poll_interval_ms: u64,
    /// Simulated pairing latency in milliseconds
    pub connect_latency_ms: u64,
}

impl Settings {
    /// Load settings from file and environment with sane defaults
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("profile", "toyota_vigo_champ")?
            .set_default("fault_mode", "NORMAL")?
            .set_default("poll_interval_ms", 100)?
            .set_default("connect_latency_ms", 1000)?
            .add_source(config::File::with_name("diagmon").required(false))
            .add_source(config::Environment::with_prefix("DIAGMON"))
            .build()?
            .try_deserialize()
    }
}
