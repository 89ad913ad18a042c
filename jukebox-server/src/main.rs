//! jukebox-server - shared queue HTTP API and push channel
//!
//! Serves the queue endpoints and the `/ws` push channel. The backing store is
//! either a remote sheet API or a local SQLite file, selected by configuration.

use anyhow::{Context, Result};
use clap::Parser;
use jukebox_common::config::{StoreBackend, TomlConfig};
use jukebox_common::logging::init_tracing;
use jukebox_server::notifier::{ChangeNotifier, DEFAULT_CAPACITY};
use jukebox_server::search::YouTubeSearch;
use jukebox_server::store::{open_store, QueueStoreClient};
use jukebox_server::{build_router, AppState};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;

/// Command-line arguments for jukebox-server
#[derive(Parser, Debug)]
#[command(name = "jukebox-server")]
#[command(about = "Shared playback queue server")]
#[command(version)]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, env = "JUKEBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Store backend: sheet | sqlite
    #[arg(long)]
    store: Option<StoreBackend>,

    /// Sheet API base URL (sheet backend)
    #[arg(long)]
    sheet_url: Option<String>,

    /// SQLite database path (sqlite backend)
    #[arg(long)]
    sqlite_path: Option<String>,

    /// Log level / filter when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// Command-line values win over environment and file
    fn apply(self, config: &mut TomlConfig) {
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(store) = self.store {
            config.store.backend = store;
        }
        if let Some(url) = self.sheet_url {
            config.store.sheet_url = Some(url);
        }
        if let Some(path) = self.sqlite_path {
            config.store.sqlite_path = path;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = TomlConfig::load(args.config.as_deref());
    args.apply(&mut config);

    init_tracing(&config.logging.level);

    info!(
        "Starting jukebox-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    config.validate().context("Invalid configuration")?;

    let store = open_store(&config.store)
        .await
        .context("Failed to open queue store")?;
    info!("Queue store backend: {}", store.name());

    let notifier = ChangeNotifier::new(DEFAULT_CAPACITY);
    let search = YouTubeSearch::new(Duration::from_secs(config.store.request_timeout_secs))
        .context("Failed to build search client")?;

    let state = AppState::new(QueueStoreClient::new(store, notifier), Arc::new(search));
    let app = build_router(state);

    let ip = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    let addr = SocketAddr::new(ip, config.server.port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("jukebox-server listening on http://{}", addr);
    info!("Push channel: ws://{}/ws", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
