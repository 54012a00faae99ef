//! packetlog Binary Entry Point
//!
//! Runs the UDP listener and the web server against one database.
//! Core functionality is provided by the `packetlog` library crate.

use std::path::PathBuf;

use clap::Parser;
use packetlog::{
    StorageBuilder, UdpListener,
    config::AppConfig,
    server::{AppState, create_router},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// packetlog - record UDP datagrams and browse them over HTTP
#[derive(Parser, Debug)]
#[command(name = "packetlog", version, about, long_about = None)]
struct Cli {
    /// Optional YAML configuration file
    #[arg(short, long, env = "PACKETLOG_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listen address for webserver
    #[arg(
        short = 'w',
        long,
        env = "PACKETLOG_WEBSERVER_LISTEN_ADDRESS",
        value_name = "[HOST]:PORT"
    )]
    webserver_listen_address: Option<String>,

    /// Static dir for files served through webserver
    #[arg(
        short = 's',
        long,
        env = "PACKETLOG_WEBSERVER_STATIC_DIR",
        value_name = "DIRECTORY"
    )]
    webserver_static_dir: Option<String>,

    /// Listen address for UDP listener
    #[arg(short = 'u', long, env = "PACKETLOG_UDP_LISTENER", value_name = "[HOST]:PORT")]
    udp_listener: Option<String>,

    /// Size of UDP read buffer
    #[arg(short = 'b', long, env = "PACKETLOG_UDP_BUFFER_SIZE", value_name = "BYTES")]
    udp_buffer_size: Option<usize>,

    /// Data storage file
    #[arg(short = 'd', long, env = "PACKETLOG_DB", value_name = "FILE")]
    db: Option<String>,

    /// Turn on verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Apply CLI/env overrides (CLI > ENV > config file > defaults).
    fn apply(self, config: &mut AppConfig) {
        if let Some(listen) = self.webserver_listen_address {
            config.server.listen = listen;
        }
        if let Some(dir) = self.webserver_static_dir {
            config.server.static_dir = dir;
        }
        if let Some(listen) = self.udp_listener {
            config.ingest.listen = listen;
        }
        if let Some(size) = self.udp_buffer_size {
            config.ingest.buffer_size = size;
        }
        if let Some(path) = self.db {
            config.database.path = path;
        }
        if self.verbose {
            config.ingest.verbose = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse CLI arguments first so --verbose can shape the log filter
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "debug,packetlog=debug"
    } else {
        "info,packetlog=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("packetlog - UDP datagram recorder");

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };
    cli.apply(&mut config);
    config.validate()?;

    let server_addr = config.server_addr()?;
    let listener_config = config.listener_config()?;

    tracing::info!(
        "Webserver: {}, UDP: {}, Database: {} ({})",
        server_addr,
        listener_config.bind,
        config.database.path,
        config.database.lock_policy,
    );

    // Build storage layer
    let handles = StorageBuilder::new(&config.database.path)
        .lock_policy(config.database.lock_policy)
        .pool_size(config.database.pool_size)
        .build()
        .await?;

    tracing::info!("Storage initialized at: {}", handles.path().display());

    // Bind UDP before serving anything; a bind failure aborts startup
    let listener = UdpListener::bind(listener_config, handles.writer.clone()).await?;
    let ingest = listener.spawn()?;

    let app = create_router(AppState {
        reader: handles.reader.clone(),
        static_dir: PathBuf::from(&config.server.static_dir),
    });

    let tcp = tokio::net::TcpListener::bind(server_addr).await?;
    tracing::info!("Webserver listening on: http://{}", server_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(tcp, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down UDP listener...");
    ingest.shutdown().await;

    tracing::info!("Shutting down storage...");
    if let Err(e) = handles.shutdown().await {
        tracing::error!("Failed to shutdown storage: {}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Setup graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
