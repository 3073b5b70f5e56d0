//! Diagnostic Monitor - Main Entry Point
//!
//! Wires the simulated transport to a per-session diagnostic enforcer and
//! logs each report. This is the presentation collaborator's seat: a real
//! front-end would consume the same report stream.

mod settings;

use anyhow::Context;
use diag_enforcer::{DiagnosticEnforcer, DiagnosticReport};
use fault_analysis::HealthStatus;
use settings::Settings;
use signal_sim::{SimTransport, TransportConfig};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use vehicle_profile::VehicleProfile;

/// Initialize the global tracing subscriber
fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== raildiag monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load().context("loading settings")?;
    info!(?settings, "settings loaded");

    let profile = load_profile(&settings.profile)
        .with_context(|| format!("loading vehicle profile '{}'", settings.profile))?;

    let mut transport = SimTransport::new(TransportConfig {
        poll_interval_ms: settings.poll_interval_ms,
        connect_latency_ms: settings.connect_latency_ms,
        ..TransportConfig::default()
    });
    transport.set_profile(profile.clone());

    let mut enforcer = DiagnosticEnforcer::new(profile);

    let mut frames = transport
        .connect(settings.fault_mode)
        .await
        .context("connecting transport")?;

    info!("monitoring, press Ctrl-C to stop");

    loop {
        tokio::select! {
            maybe_frame = frames.recv() => {
                match maybe_frame {
                    Some(frame) => log_report(&enforcer.process(&frame)),
                    None => {
                        warn!("frame stream ended");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                transport.disconnect().await.context("disconnecting transport")?;
                break;
            }
        }
    }

    Ok(())
}

/// Resolve a profile argument: a path to JSON on disk, or a builtin name
fn load_profile(name_or_path: &str) -> anyhow::Result<VehicleProfile> {
    let profile = if name_or_path.ends_with(".json") {
        VehicleProfile::from_file(name_or_path)?
    } else {
        VehicleProfile::builtin(name_or_path)?
    };
    Ok(profile)
}

/// Log one report; faults get the full serialized verdict
fn log_report(report: &DiagnosticReport) {
    let rail = &report.analysis.rail_system;
    let fuel = &report.analysis.fuel_system;

    let rail_kpa = report.values.rail_pressure_kpa.round();

    if rail.status == HealthStatus::Normal && fuel.status == HealthStatus::Normal {
        info!(rail_kpa, "rail OK, injectors OK");
        return;
    }

    let verdict = serde_json::to_string(&report.analysis).unwrap_or_default();
    warn!(rail_kpa, %verdict, "fault detected");
}
