//! packetlog - UDP datagram recorder
//!
//! Records every UDP datagram it receives into SQLite and serves the history
//! over HTTP. It can be used as a library, or run as a standalone binary with
//! the `packetlog` executable.
//!
//! # Architecture
//!
//! - **Ingest**: One UDP receive loop writing each datagram synchronously
//! - **Storage**: SQLite `data` table behind a single lock
//! - **Server**: Paginated record listing and raw payload download
//!
//! # Example
//!
//! ```rust,no_run
//! use packetlog::{ListenerConfig, StorageBuilder, UdpListener};
//! use packetlog::server::{AppState, create_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let handles = StorageBuilder::new("packetlog.db").build().await?;
//!
//!     let listener = UdpListener::bind(
//!         ListenerConfig::new("0.0.0.0:7000".parse()?),
//!         handles.writer.clone(),
//!     )
//!     .await?;
//!     let _ingest = listener.spawn()?;
//!
//!     let app = create_router(AppState {
//!         reader: handles.reader.clone(),
//!         static_dir: "static".into(),
//!     });
//!     let tcp = tokio::net::TcpListener::bind("0.0.0.0:8008").await?;
//!     axum::serve(tcp, app).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod ingest;
pub mod server;
pub mod storage;

pub use ingest::{IngestError, ListenerConfig, ListenerHandle, StatsSnapshot, UdpListener};
pub use storage::{
    ListQuery, LockPolicy, NewRecord, Record, RecordReader, RecordStore, RecordWriter,
    StorageBuilder, StorageError, StorageHandles,
};
