//! Error types for the exporter.
//!
//! Configuration errors live next to the configuration in [`crate::config`].

use std::net::SocketAddr;

use thiserror::Error;

/// Errors from one collection cycle against the broker management API.
///
/// None of these are fatal: the collector logs them and the scrape answers
/// with an empty metric set.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The broker could not be reached (DNS, connect, timeout, body read).
    #[error("Failed to fetch data from broker API: {0}")]
    Transport(String),

    /// The broker answered with something other than 200 OK.
    #[error("Unexpected status code from broker API: {0}")]
    Status(u16),

    /// The body is not a JSON array of queue records.
    #[error("Failed to decode broker API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ScrapeError {
    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Short classification used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Transport(_) => "transport",
            ScrapeError::Status(_) => "status",
            ScrapeError::Decode(_) => "decode",
        }
    }
}

/// Errors from the metrics HTTP listener.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured port could not be claimed.
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The listener failed after it was bound.
    #[error("HTTP server error: {0}")]
    Serve(#[source] std::io::Error),
}
