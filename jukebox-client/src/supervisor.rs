//! Optional reconnect supervisor
//!
//! Watches the connection state and calls `reconnect()` after each loss,
//! waiting longer after every consecutive failure.

use crate::connection::{ConnectionManager, ConnectionState};
use jukebox_common::config::ReconnectConfig;
use std::time::Duration;
use tracing::{debug, info};

/// Exponential backoff: initial delay, doubled per attempt, capped
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    next: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let initial = initial.min(max);
        Self { initial, max, next: initial }
    }

    pub fn from_config(config: &ReconnectConfig) -> Self {
        Self::new(
            Duration::from_millis(config.initial_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// Delay before the next attempt
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.next = self.initial;
    }
}

/// Runs for the life of the process; spawn it as a task
pub async fn supervise(connection: ConnectionManager, config: ReconnectConfig) {
    let mut state = connection.watch_state();
    let mut backoff = Backoff::from_config(&config);
    info!(
        initial_ms = config.initial_delay_ms,
        max_ms = config.max_delay_ms,
        "Reconnect supervisor started"
    );

    loop {
        let current = *state.borrow_and_update();
        match current {
            ConnectionState::Connected => backoff.reset(),
            ConnectionState::Disconnected => {
                let delay = backoff.next_delay();
                info!("Push channel down, retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
                connection.reconnect();
            }
            ConnectionState::Connecting => {}
        }

        if state.changed().await.is_err() {
            debug!("Connection state channel closed, supervisor exiting");
            break;
        }
    }
}
