//! Push channel (WebSocket)
//!
//! Each connection runs in its own task: it forwards `queue_updated` signals
//! from the change notifier and logs the advisory messages clients send.

use crate::notifier::ChangeNotifier;
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use jukebox_common::events::{ClientMessage, ServerMessage};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// GET /ws - upgrade to the push channel
pub async fn push_channel(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let notifier = state.queue.notifier().clone();
    ws.on_upgrade(move |socket| handle_observer(socket, notifier))
}

async fn handle_observer(socket: WebSocket, notifier: ChangeNotifier) {
    let observer_id = Uuid::new_v4();
    let mut signals = notifier.subscribe();
    info!(%observer_id, observers = notifier.observer_count(), "Push observer connected");

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            signal = signals.recv() => {
                let message = match signal {
                    Ok(message) => message,
                    Err(RecvError::Lagged(skipped)) => {
                        // Collapsed signals still mean "refetch"
                        warn!(%observer_id, skipped, "Push observer lagged");
                        ServerMessage::QueueUpdated
                    }
                    Err(RecvError::Closed) => break,
                };

                if let Err(e) = sender.send(Message::Text(message.to_json())).await {
                    debug!(%observer_id, "Send to observer failed: {}", e);
                    break;
                }
            }

            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => log_advisory(&observer_id, &text),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(%observer_id, "Observer transport error: {}", e);
                    break;
                }
            },
        }
    }

    drop(signals);
    info!(%observer_id, observers = notifier.observer_count(), "Push observer disconnected");
}

/// Client messages are hints only; nothing authoritative happens here
fn log_advisory(observer_id: &Uuid, text: &str) {
    match ClientMessage::parse(text) {
        Ok(ClientMessage::AddSong { song }) => {
            info!(%observer_id, video_id = %song.video_id, title = %song.title, "Peer added song");
        }
        Ok(ClientMessage::SongRemoved { video_id }) => {
            info!(%observer_id, video_id = %video_id, "Peer finished song");
        }
        Err(e) => warn!(%observer_id, "Dropping unparseable client message: {}", e),
    }
}
