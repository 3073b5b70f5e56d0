//! Simulated Transport
//!
//! Stands in for a real adapter connection: a timer-driven producer task
//! that emits raw frames into a bounded channel at the polling rate. The
//! consumer side is the same whether frames come from here or from real
//! hardware, so the downstream pipeline cannot tell the difference.

use crate::engine::SimulationEngine;
use crate::error::TransportError;
use crate::fault::{encode_ambient_channels, FaultFrameGenerator, FaultMode};
use mode21_codec::Mode21Frame;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use vehicle_profile::VehicleProfile;

/// Configuration for the simulated transport
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Polling tick interval in milliseconds (default: 100 = 10 Hz)
    pub poll_interval_ms: u64,
    /// Simulated connection latency in milliseconds
    pub connect_latency_ms: u64,
    /// Frame channel depth; overruns are dropped, never queued unbounded
    pub channel_depth: usize,
    /// Poll ticks between drive-state transition checks (default: 20 = 2 s)
    pub state_check_ticks: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            connect_latency_ms: 1000,
            channel_depth: 32,
            state_check_ticks: 20,
        }
    }
}

/// Simulated adapter connection.
///
/// One instance per session: `connect` spawns the producer task and hands
/// back the frame stream, `disconnect` halts the task deterministically.
/// No frame is produced after `disconnect` returns.
pub struct SimTransport {
    config: TransportConfig,
    profile: Option<VehicleProfile>,
    fault_mode: watch::Sender<FaultMode>,
    producer: Option<JoinHandle<()>>,
    seed: Option<u64>,
}

impl SimTransport {
    /// Create a disconnected transport with the given config
    pub fn new(config: TransportConfig) -> Self {
        let (fault_mode, _) = watch::channel(FaultMode::Normal);
        Self {
            config,
            profile: None,
            fault_mode,
            producer: None,
            seed: None,
        }
    }

    /// Fix the simulation RNG seed (deterministic tests)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the vehicle configuration used to synthesize extended PIDs.
    ///
    /// Takes effect on the next connect.
    pub fn set_profile(&mut self, profile: VehicleProfile) {
        debug!(vehicle = %profile.vehicle_name, "transport vehicle profile set");
        self.profile = Some(profile);
    }

    /// Switch the fault scenario; applies to the running session immediately
    pub fn set_fault_mode(&self, mode: FaultMode) {
        // send_replace stores the value even with no live session subscribed,
        // so a mode set while idle applies to the next connect.
        self.fault_mode.send_replace(mode);
    }

    /// Currently selected fault scenario
    pub fn fault_mode(&self) -> FaultMode {
        *self.fault_mode.borrow()
    }

    /// Whether a producer session is running
    pub fn is_connected(&self) -> bool {
        self.producer.is_some()
    }

    /// Establish the simulated connection and start producing frames.
    ///
    /// Resolves after the simulated pairing latency. The returned receiver
    /// is the transport-to-enforcer boundary; it closes when the session
    /// ends.
    pub async fn connect(
        &mut self,
        mode: FaultMode,
    ) -> Result<mpsc::Receiver<Mode21Frame>, TransportError> {
        if self.producer.is_some() {
            return Err(TransportError::AlreadyConnected);
        }

        info!(
            latency_ms = self.config.connect_latency_ms,
            ?mode,
            "connecting simulated transport"
        );
        tokio::time::sleep(Duration::from_millis(self.config.connect_latency_ms)).await;

        self.set_fault_mode(mode);

        let (frame_tx, frame_rx) = mpsc::channel(self.config.channel_depth);
        let fault_rx = self.fault_mode.subscribe();
        let config = self.config.clone();
        let profile = self.profile.clone();
        let seed = self.seed;

        self.producer = Some(tokio::spawn(produce_frames(
            config, profile, seed, fault_rx, frame_tx,
        )));

        info!("simulated transport connected");
        Ok(frame_rx)
    }

    /// Halt the producer task and close the frame stream.
    ///
    /// Deterministic: after this returns, the timer is stopped and no
    /// further frame is sent.
    pub async fn disconnect(&mut self) -> Result<(), TransportError> {
        let producer = self.producer.take().ok_or(TransportError::NotConnected)?;

        producer.abort();
        // Wait for the task to actually finish so no tick can fire after
        // disconnect resolves. An abort surfaces as a JoinError; that is
        // the expected path.
        let _ = producer.await;

        info!("simulated transport disconnected");
        Ok(())
    }
}

/// Producer loop: one frame per poll tick until cancelled.
async fn produce_frames(
    config: TransportConfig,
    profile: Option<VehicleProfile>,
    seed: Option<u64>,
    fault_rx: watch::Receiver<FaultMode>,
    frame_tx: mpsc::Sender<Mode21Frame>,
) {
    let mut engine = match seed {
        Some(seed) => SimulationEngine::with_seed(seed),
        None => SimulationEngine::new(),
    };
    let mut generator = match seed {
        Some(seed) => FaultFrameGenerator::with_seed(seed.wrapping_add(1)),
        None => FaultFrameGenerator::new(),
    };

    let mut interval = tokio::time::interval(Duration::from_millis(config.poll_interval_ms));
    // Overrun ticks are dropped by re-arming, never queued
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut tick: u64 = 0;
    let mut dropped: u64 = 0;

    loop {
        interval.tick().await;
        tick += 1;

        if tick % config.state_check_ticks == 0 {
            engine.maybe_transition();
        }
        let snapshot = engine.update();

        generator.set_mode(*fault_rx.borrow());
        let mut frame = generator.next_frame(now_ms());
        if let Some(profile) = &profile {
            encode_ambient_channels(&mut frame, &snapshot, profile);
        }

        match frame_tx.try_send(frame) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                dropped += 1;
                warn!(dropped, "frame channel full, dropping frame");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("frame channel closed, stopping producer");
                break;
            }
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
