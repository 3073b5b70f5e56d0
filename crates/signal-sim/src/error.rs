//! Transport Error Types

use thiserror::Error;

/// Errors from the simulated transport lifecycle
#[derive(Debug, Error)]
pub enum TransportError {
    /// connect() called while a session is already running
    #[error("transport is already connected")]
    AlreadyConnected,

    /// disconnect() or a setter that requires a session, called while idle
    #[error("transport is not connected")]
    NotConnected,
}
