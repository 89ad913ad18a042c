//! Push channel connection manager
//!
//! One WebSocket to the server's `/ws` endpoint. Received frames are parsed and
//! delivered in order on a single event channel; outbound messages are dropped
//! unless the connection is up. Nothing here reconnects on its own: a lost
//! connection stays `Disconnected` until [`ConnectionManager::reconnect`] is
//! called (by the operator or the supervisor).

use futures::{SinkExt, StreamExt};
use jukebox_common::events::{ClientMessage, ServerMessage};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting..."),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Disconnected => write!(f, "reconnecting..."),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Handshake completed
    Established,
    Message(ServerMessage),
    /// Transport closed, errored, or the handshake failed
    Lost,
}

#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

struct Inner {
    url: String,
    state: watch::Sender<ConnectionState>,
    /// Writer queue of the live connection, if any
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
}

impl ConnectionManager {
    /// Create a manager for `url`; events arrive on the returned receiver
    pub fn new(url: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ConnectionState::Connecting);

        let manager = Self {
            inner: Arc::new(Inner {
                url: url.into(),
                state,
                outbound: Mutex::new(None),
                events,
            }),
        };
        (manager, rx)
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Start the connection task
    pub fn connect(&self) {
        self.inner.state.send_replace(ConnectionState::Connecting);
        debug!(url = %self.inner.url, "Opening push connection");
        tokio::spawn(run_connection(self.inner.clone()));
    }

    /// Re-open a lost connection; ignored in any state but `Disconnected`
    pub fn reconnect(&self) -> bool {
        if self.state() != ConnectionState::Disconnected {
            debug!(state = ?self.state(), "Reconnect ignored");
            return false;
        }
        info!(url = %self.inner.url, "Reconnecting push channel");
        self.connect();
        true
    }

    /// Send an advisory message; silently dropped unless connected
    pub fn send(&self, message: &ClientMessage) {
        if self.state() != ConnectionState::Connected {
            debug!("Push channel down, dropping outbound message");
            return;
        }

        let text = match message.to_json() {
            Ok(text) => text,
            Err(e) => {
                warn!("Cannot encode outbound message: {}", e);
                return;
            }
        };

        if let Some(writer) = self.inner.outbound().as_ref() {
            let _ = writer.send(text);
        }
    }
}

impl Inner {
    fn outbound(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<String>>> {
        self.outbound.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, text: &str) {
        match ServerMessage::parse(text) {
            Ok(message) => {
                let _ = self.events.send(ConnectionEvent::Message(message));
            }
            Err(e) => warn!("Dropping malformed push message: {}", e),
        }
    }

    fn set_disconnected(&self) {
        self.outbound().take();
        self.state.send_replace(ConnectionState::Disconnected);
        let _ = self.events.send(ConnectionEvent::Lost);
    }
}

async fn run_connection(inner: Arc<Inner>) {
    let stream = match connect_async(inner.url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            warn!(url = %inner.url, "Push connection failed: {}", e);
            inner.set_disconnected();
            return;
        }
    };

    let (mut sink, mut source) = stream.split();
    let (writer, mut outgoing) = mpsc::unbounded_channel::<String>();
    *inner.outbound() = Some(writer);

    inner.state.send_replace(ConnectionState::Connected);
    info!(url = %inner.url, "Push channel connected");
    let _ = inner.events.send(ConnectionEvent::Established);

    loop {
        tokio::select! {
            Some(text) = outgoing.recv() => {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    warn!("Push send failed: {}", e);
                    break;
                }
            }

            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => inner.deliver(&text),
                Some(Ok(Message::Close(_))) | None => {
                    info!("Push channel closed by server");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Push channel error: {}", e);
                    break;
                }
            },
        }
    }

    inner.set_disconnected();
}
