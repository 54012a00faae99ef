//! Ingestion error types.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while setting up or running the UDP listener.
///
/// Only setup errors are returned to callers; per-datagram failures are
/// logged inside the receive loop.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The UDP socket could not be bound.
    #[error("failed to bind UDP socket on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Listener configuration is unusable.
    #[error("invalid listener config: {0}")]
    Config(String),

    /// Socket I/O error.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}
