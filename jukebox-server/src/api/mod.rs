//! HTTP API handlers for jukebox-server

pub mod handlers;
pub mod health;
pub mod push;

pub use handlers::{add_song, get_queue, remove_song, search, update_status};
pub use health::health_routes;
pub use push::push_channel;
