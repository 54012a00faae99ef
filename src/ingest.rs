//! Ingestion Layer
//!
//! A single UDP receive loop that hands every datagram to the record store.
//! The loop runs in its own Tokio task for the lifetime of the process.
//!
//! # Example
//!
//! ```rust,no_run
//! use packetlog::{ListenerConfig, StorageBuilder, UdpListener};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let handles = StorageBuilder::new("/tmp/packetlog.db").build().await?;
//! let config = ListenerConfig::new("0.0.0.0:7000".parse()?).with_buffer_size(2048);
//! let listener = UdpListener::bind(config, handles.writer.clone()).await?;
//! let handle = listener.spawn()?;
//! # handle.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod error;
mod listener;

pub use error::IngestError;
pub use listener::{
    DEFAULT_BUFFER_SIZE, ListenerConfig, ListenerHandle, ListenerStats, MAX_BUFFER_SIZE,
    StatsSnapshot, UdpListener,
};
