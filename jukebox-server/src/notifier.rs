//! Change notifier: fan-out of `queue_updated` to push observers
//!
//! Every open push connection holds one broadcast receiver. A mutation sends a
//! single payload-free signal; each connection task forwards it on its own, so
//! a slow or closing observer never delays the others.

use jukebox_common::events::ServerMessage;
use tokio::sync::broadcast;
use tracing::debug;

/// Default number of signals buffered per observer before it lags
pub const DEFAULT_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<ServerMessage>,
}

impl ChangeNotifier {
    /// Create a new notifier
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of signals buffered per observer
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Signal every observer that the queue changed
    ///
    /// Fire-and-forget: having no observers is not an error. Returns the number
    /// of observers the signal was queued for.
    pub fn broadcast(&self) -> usize {
        match self.tx.send(ServerMessage::QueueUpdated) {
            Ok(count) => {
                debug!("Broadcast queue_updated to {} observers", count);
                count
            }
            Err(_) => {
                debug!("Broadcast queue_updated with no observers connected");
                0
            }
        }
    }

    /// Register a new observer
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.tx.subscribe()
    }

    /// Number of currently registered observers
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
