//! # Jukebox Client Library (jukebox-client)
//!
//! Keeps a local replica of the shared queue and drives the local player.
//!
//! **Architecture:**
//! - [`connection::ConnectionManager`]: push channel lifecycle
//! - [`sync::QueueSynchronizer`]: snapshot diffing
//! - [`coordinator::PlaybackCoordinator`]: cursor state machine driving the player
//! - [`app::App`]: single-task event loop wiring them together
//!
//! All core state is mutated on the [`app::App`] task only; network calls run as
//! spawned tasks whose results re-enter the loop as events.

pub mod api;
pub mod app;
pub mod connection;
pub mod console;
pub mod coordinator;
pub mod error;
pub mod supervisor;
pub mod sync;

pub use error::{ClientError, Result};
