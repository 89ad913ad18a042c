//! # Jukebox Common Library
//!
//! Shared code for the jukebox server and client:
//! - Queue data model (QueueItem, SearchResult)
//! - Push channel message types
//! - Configuration loading and resolution
//! - Logging initialization

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod model;

pub use error::{Error, Result};
pub use model::{QueueItem, SearchResult};
