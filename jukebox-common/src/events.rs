//! Push channel message types
//!
//! Server→client messages carry no payload beyond their tag: receivers re-fetch
//! the queue. Client→server messages are advisory hints the server only logs.

use serde::{Deserialize, Serialize};

use crate::model::SearchResult;

/// Tag of the only server→client message
pub const QUEUE_UPDATED: &str = "queue_updated";

/// Message pushed from the server to every open connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The pending queue changed; re-fetch it
    QueueUpdated,
}

/// Advisory message sent by a client to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A song was appended by this client
    AddSong { song: SearchResult },

    /// This client finished or removed a song
    SongRemoved {
        #[serde(rename = "videoId")]
        video_id: String,
    },
}

impl ServerMessage {
    /// Parse a text frame; unknown tags and malformed JSON are errors
    pub fn parse(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> String {
        match self {
            ServerMessage::QueueUpdated => format!(r#"{{"type":"{}"}}"#, QUEUE_UPDATED),
        }
    }
}

impl ClientMessage {
    pub fn parse(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_updated_wire_format() {
        let json = ServerMessage::QueueUpdated.to_json();
        assert_eq!(json, r#"{"type":"queue_updated"}"#);
        assert_eq!(ServerMessage::parse(&json).unwrap(), ServerMessage::QueueUpdated);
        assert_eq!(serde_json::to_string(&ServerMessage::QueueUpdated).unwrap(), json);
    }

    #[test]
    fn test_unknown_or_malformed_server_message_rejected() {
        assert!(ServerMessage::parse(r#"{"type":"something_else"}"#).is_err());
        assert!(ServerMessage::parse("not json").is_err());
        assert!(ServerMessage::parse(r#"{"kind":"queue_updated"}"#).is_err());
    }

    #[test]
    fn test_song_removed_uses_video_id_field() {
        let msg = ClientMessage::SongRemoved { video_id: "abc".to_string() };
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "song_removed");
        assert_eq!(value["videoId"], "abc");
    }

    #[test]
    fn test_add_song_carries_song() {
        let text = r#"{"type":"add_song","song":{"videoId":"v1","title":"One","thumbnail":""}}"#;
        match ClientMessage::parse(text).unwrap() {
            ClientMessage::AddSong { song } => {
                assert_eq!(song.video_id, "v1");
                assert_eq!(song.title, "One");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }
}
