//! jukebox-client - kiosk console for the shared queue
//!
//! Keeps a replica of the server's queue in sync over the push channel, drives
//! the local player and takes operator commands from stdin.

use anyhow::{Context, Result};
use clap::Parser;
use jukebox_client::api::HttpQueueApi;
use jukebox_client::app::{App, AppEvent, OperatorCommand};
use jukebox_client::connection::ConnectionManager;
use jukebox_client::console::{self, TerminalPlayerFactory, HELP};
use jukebox_client::coordinator::PlaybackCoordinator;
use jukebox_client::supervisor::supervise;
use jukebox_common::config::{PlaybackCapability, TomlConfig};
use jukebox_common::logging::init_tracing;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Command-line arguments for jukebox-client
#[derive(Parser, Debug)]
#[command(name = "jukebox-client")]
#[command(about = "Shared playback queue console")]
#[command(version)]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, env = "JUKEBOX_CONFIG")]
    config: Option<PathBuf>,

    /// Server HTTP base URL
    #[arg(long)]
    server_url: Option<String>,

    /// Push channel URL
    #[arg(long)]
    ws_url: Option<String>,

    /// Playback capability: present | absent
    #[arg(long)]
    playback: Option<PlaybackCapability>,

    /// Reconnect automatically with backoff after the push channel drops
    #[arg(long)]
    reconnect: bool,

    /// Log level / filter when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(self, config: &mut TomlConfig) {
        if let Some(url) = self.server_url {
            config.client.server_url = url;
        }
        if let Some(url) = self.ws_url {
            config.client.ws_url = url;
        }
        if let Some(playback) = self.playback {
            config.client.playback = playback;
        }
        if self.reconnect {
            config.reconnect.enabled = true;
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
        "Starting jukebox-client v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    config.validate().context("Invalid configuration")?;
    info!(
        server = %config.client.server_url,
        push = %config.client.ws_url,
        playback = ?config.client.playback,
        "Client configuration"
    );

    let api = HttpQueueApi::new(
        &config.client.server_url,
        Duration::from_secs(config.client.request_timeout_secs),
    )
    .context("Failed to build HTTP client")?;

    let (connection, connection_events) = ConnectionManager::new(config.client.ws_url.clone());
    let coordinator = PlaybackCoordinator::new(config.client.playback, Box::new(TerminalPlayerFactory));
    let (app, mut notices) = App::new(Arc::new(api), connection.clone(), coordinator);

    tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            println!("{}", console::render(&notice));
        }
    });

    tokio::spawn(read_commands(app.events()));

    if config.reconnect.enabled {
        tokio::spawn(supervise(connection, config.reconnect.clone()));
    }

    println!("{}", HELP);
    app.run(connection_events).await;

    info!("Client shutdown complete");
    Ok(())
}

/// Forward stdin lines to the event loop; end of input quits
async fn read_commands(events: mpsc::UnboundedSender<AppEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match console::parse_line(&line) {
                Ok(Some(event)) => {
                    if events.send(event).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(message) => println!("{}", message),
            },
            Ok(None) => break,
            Err(e) => {
                debug!("stdin read failed: {}", e);
                break;
            }
        }
    }

    let _ = events.send(AppEvent::Command(OperatorCommand::Quit));
}
