//! UDP datagram listener.
//!
//! Receives datagrams on one socket and writes each one to storage before
//! reading the next, so record ids follow arrival order.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use crate::ingest::IngestError;
use crate::storage::{NewRecord, RecordWriter};

/// Default receive buffer size in bytes.
///
/// Datagrams longer than the buffer are truncated by the OS.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Largest payload a UDP datagram can carry.
pub const MAX_BUFFER_SIZE: usize = 65_507;

/// Pause after a failed socket read before reading again.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Configuration for the UDP listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    /// Socket address to bind.
    pub bind: SocketAddr,
    /// Receive buffer size in bytes.
    pub buffer_size: usize,
    /// Log every stored record as JSON.
    pub verbose: bool,
}

impl ListenerConfig {
    pub fn new(bind: SocketAddr) -> Self {
        Self {
            bind,
            buffer_size: DEFAULT_BUFFER_SIZE,
            verbose: false,
        }
    }

    /// Set the receive buffer size.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set verbose per-record logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.buffer_size == 0 || self.buffer_size > MAX_BUFFER_SIZE {
            return Err(IngestError::Config(format!(
                "buffer size must be between 1 and {MAX_BUFFER_SIZE}, got {}",
                self.buffer_size
            )));
        }
        Ok(())
    }
}

/// Counters maintained by the receive loop.
#[derive(Debug, Default)]
pub struct ListenerStats {
    received: AtomicU64,
    stored: AtomicU64,
    dropped: AtomicU64,
    recv_errors: AtomicU64,
}

/// Point-in-time copy of [`ListenerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Datagrams read from the socket.
    pub received: u64,
    /// Datagrams persisted.
    pub stored: u64,
    /// Datagrams lost to write failures.
    pub dropped: u64,
    /// Failed socket reads.
    pub recv_errors: u64,
}

impl ListenerStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            stored: self.stored.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            recv_errors: self.recv_errors.load(Ordering::Relaxed),
        }
    }
}

/// UDP listener feeding the record store.
pub struct UdpListener {
    socket: UdpSocket,
    config: ListenerConfig,
    writer: RecordWriter,
    stats: Arc<ListenerStats>,
}

impl std::fmt::Debug for UdpListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpListener")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl UdpListener {
    /// Bind the socket.
    ///
    /// # Errors
    /// Returns `IngestError::Bind` if the address cannot be bound and
    /// `IngestError::Config` for an unusable buffer size.
    pub async fn bind(config: ListenerConfig, writer: RecordWriter) -> Result<Self, IngestError> {
        config.validate()?;

        let socket = UdpSocket::bind(config.bind)
            .await
            .map_err(|source| IngestError::Bind {
                addr: config.bind,
                source,
            })?;

        tracing::info!(
            addr = %socket.local_addr()?,
            buffer_size = config.buffer_size,
            "Started UDP listener"
        );

        Ok(Self {
            socket,
            config,
            writer,
            stats: Arc::new(ListenerStats::default()),
        })
    }

    /// Address the socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, IngestError> {
        Ok(self.socket.local_addr()?)
    }

    /// Shared counters for this listener.
    pub fn stats(&self) -> Arc<ListenerStats> {
        Arc::clone(&self.stats)
    }

    /// Run the receive loop on a dedicated task.
    pub fn spawn(self) -> Result<ListenerHandle, IngestError> {
        let local_addr = self.local_addr()?;
        let stats = self.stats();
        let task = tokio::spawn(self.run());

        Ok(ListenerHandle {
            local_addr,
            stats,
            task,
        })
    }

    /// Receive datagrams until the task is dropped.
    ///
    /// Socket read errors are logged and the loop keeps reading. A datagram
    /// whose write fails is logged and dropped.
    pub async fn run(self) {
        let mut buffer = vec![0u8; self.config.buffer_size];

        loop {
            let (len, peer) = match self.socket.recv_from(&mut buffer).await {
                Ok(received) => received,
                Err(e) => {
                    self.recv_failed(&e).await;
                    continue;
                }
            };
            self.stats.received.fetch_add(1, Ordering::Relaxed);

            let record = NewRecord::received(peer.to_string(), &buffer[..len]);
            self.persist(record).await;
        }
    }

    async fn recv_failed(&self, err: &std::io::Error) {
        self.stats.recv_errors.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(error = %err, "Error reading datagram");
        tokio::time::sleep(RECV_ERROR_BACKOFF).await;
    }

    async fn persist(&self, record: NewRecord) {
        match self.writer.write(&record).await {
            Ok(id) => {
                self.stats.stored.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(id, from = %record.source_address, size = record.size(), "Datagram stored");

                if self.config.verbose {
                    match serde_json::to_string(&record.into_record(id)) {
                        Ok(json) => tracing::info!("DATA> {}", json),
                        Err(e) => tracing::warn!(error = %e, "Error marshalling record to JSON"),
                    }
                }
            }
            Err(e) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    error = %e,
                    from = %record.source_address,
                    size = record.size(),
                    "Error storing datagram, dropped"
                );
            }
        }
    }
}

/// Handle to a spawned listener task.
#[derive(Debug)]
pub struct ListenerHandle {
    local_addr: SocketAddr,
    stats: Arc<ListenerStats>,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Address the socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Current counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Whether the receive task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the receive loop and return the final counters.
    pub async fn shutdown(self) -> StatsSnapshot {
        self.task.abort();
        let _ = self.task.await;

        let stats = self.stats.snapshot();
        tracing::info!(
            received = stats.received,
            stored = stats.stored,
            dropped = stats.dropped,
            recv_errors = stats.recv_errors,
            "UDP listener stopped"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ListQuery, StorageBuilder, StorageHandles};
    use std::time::Duration;
    use tempfile::{TempDir, tempdir};

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    async fn storage() -> (StorageHandles, TempDir) {
        let dir = tempdir().unwrap();
        let handles = StorageBuilder::new(dir.path().join("ingest.db"))
            .build()
            .await
            .unwrap();
        (handles, dir)
    }

    async fn wait_for_count(handles: &StorageHandles, expected: i64) -> i64 {
        let mut count = 0;
        for _ in 0..200 {
            count = handles.reader.count().await.unwrap();
            if count >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        count
    }

    #[test]
    fn test_listener_config_defaults() {
        let config = ListenerConfig::new(loopback());
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_listener_config_rejects_bad_buffer() {
        assert!(ListenerConfig::new(loopback()).with_buffer_size(0).validate().is_err());
        assert!(
            ListenerConfig::new(loopback())
                .with_buffer_size(MAX_BUFFER_SIZE + 1)
                .validate()
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_datagrams_are_stored_in_order() {
        let (handles, _dir) = storage().await;
        let listener = UdpListener::bind(ListenerConfig::new(loopback()), handles.writer.clone())
            .await
            .unwrap();
        let handle = listener.spawn().unwrap();

        let sender = UdpSocket::bind(loopback()).await.unwrap();
        sender.send_to(b"hello", handle.local_addr()).await.unwrap();
        assert_eq!(wait_for_count(&handles, 1).await, 1);
        sender.send_to(b"world", handle.local_addr()).await.unwrap();
        assert_eq!(wait_for_count(&handles, 2).await, 2);

        let records = handles.reader.list(ListQuery::default()).await.unwrap();
        assert_eq!(records[0].id, 2);
        assert_eq!(records[0].payload, b"world");
        assert_eq!(records[1].id, 1);
        assert_eq!(records[1].payload, b"hello");
        assert_eq!(
            records[1].source_address,
            sender.local_addr().unwrap().to_string()
        );

        let stats = handle.shutdown().await;
        assert_eq!(stats.received, 2);
        assert_eq!(stats.stored, 2);
        assert_eq!(stats.dropped, 0);
    }

    #[tokio::test]
    async fn test_oversized_datagram_is_truncated() {
        let (handles, _dir) = storage().await;
        let config = ListenerConfig::new(loopback()).with_buffer_size(4);
        let handle = UdpListener::bind(config, handles.writer.clone())
            .await
            .unwrap()
            .spawn()
            .unwrap();

        let sender = UdpSocket::bind(loopback()).await.unwrap();
        sender
            .send_to(b"0123456789", handle.local_addr())
            .await
            .unwrap();
        assert_eq!(wait_for_count(&handles, 1).await, 1);

        let record = handles.reader.get(1).await.unwrap();
        assert_eq!(record.payload, b"0123");
        assert_eq!(record.size, 4);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_write_failure_drops_datagram_and_continues() {
        let (handles, _dir) = storage().await;
        let handle = UdpListener::bind(ListenerConfig::new(loopback()), handles.writer.clone())
            .await
            .unwrap()
            .spawn()
            .unwrap();
        let addr = handle.local_addr();

        // Closing storage makes every write fail
        let reader = handles.reader.clone();
        handles.shutdown().await.unwrap();

        let sender = UdpSocket::bind(loopback()).await.unwrap();
        sender.send_to(b"lost", addr).await.unwrap();
        sender.send_to(b"lost again", addr).await.unwrap();

        for _ in 0..200 {
            if handle.stats().dropped >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let stats = handle.stats();
        assert_eq!(stats.received, 2);
        assert_eq!(stats.dropped, 2);
        assert_eq!(stats.stored, 0);
        assert!(!handle.is_finished(), "loop must survive write failures");
        assert!(reader.count().await.is_err());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_read_error_is_counted_and_loop_continues() {
        let (handles, _dir) = storage().await;
        let listener = UdpListener::bind(ListenerConfig::new(loopback()), handles.writer.clone())
            .await
            .unwrap();

        let started = tokio::time::Instant::now();
        listener
            .recv_failed(&std::io::Error::other("connection refused"))
            .await;
        assert!(started.elapsed() >= RECV_ERROR_BACKOFF);
        assert_eq!(listener.stats().snapshot().recv_errors, 1);

        let handle = listener.spawn().unwrap();
        let sender = UdpSocket::bind(loopback()).await.unwrap();
        sender.send_to(b"after", handle.local_addr()).await.unwrap();
        assert_eq!(wait_for_count(&handles, 1).await, 1);

        let stats = handle.shutdown().await;
        assert_eq!(stats.recv_errors, 1);
        assert_eq!(stats.stored, 1);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_fatal() {
        let (handles, _dir) = storage().await;
        let first = UdpListener::bind(ListenerConfig::new(loopback()), handles.writer.clone())
            .await
            .unwrap();
        let taken = first.local_addr().unwrap();

        let err = UdpListener::bind(ListenerConfig::new(taken), handles.writer.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Bind { addr, .. } if addr == taken));
    }

    #[tokio::test]
    async fn test_verbose_listener_stores_records() {
        let (handles, _dir) = storage().await;
        let config = ListenerConfig::new(loopback()).with_verbose(true);
        let handle = UdpListener::bind(config, handles.writer.clone())
            .await
            .unwrap()
            .spawn()
            .unwrap();

        let sender = UdpSocket::bind(loopback()).await.unwrap();
        sender.send_to(&[0xff, 0x00, 0x7f], handle.local_addr()).await.unwrap();
        assert_eq!(wait_for_count(&handles, 1).await, 1);
        assert_eq!(handles.reader.get(1).await.unwrap().payload, vec![0xff, 0x00, 0x7f]);

        handle.shutdown().await;
    }
}
