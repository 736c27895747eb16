//! Error types for the chat client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The handshake did not complete
    #[error("Unable to connect: {0}")]
    UnableToConnect(String),

    /// An established connection ended or failed
    #[error("Disconnected: {0}")]
    Disconnected(String),

    /// The HTTP liveness probe failed
    #[error("Probe failed: {0}")]
    Probe(#[from] reqwest::Error),

    #[error("Invalid server URL '{0}'")]
    InvalidUrl(String),
}

/// Returned by [`ClientHandle::send`](crate::ClientHandle::send).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    /// Outbound text is only accepted while connected; it was dropped.
    #[error("not connected; message dropped")]
    NotConnected,
}
