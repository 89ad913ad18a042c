//! Error types for jukebox-client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level HTTP failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Target item does not exist (already removed by a peer)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ClientError {
    /// True for the "someone else already removed it" case
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
