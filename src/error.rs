//! Error types for the hotspot engine and the accident feed.

use std::fmt;

/// Errors raised by the engine's own input validation.
///
/// Bad accident records are never errors; they are excluded from the batch.
#[derive(Debug, Clone, PartialEq)]
pub enum HotspotError {
    /// Malformed query center or radius. The caller must fix the input.
    InvalidArgument(String),
}

impl fmt::Display for HotspotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotspotError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for HotspotError {}

/// Errors talking to the accident backend or decoding its push frames.
#[derive(Debug)]
pub enum FeedError {
    Http(reqwest::Error),
    Api { status: u16, detail: String },
    Decode(serde_json::Error),
    Envelope(String),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Http(err) => write!(f, "http error: {}", err),
            FeedError::Api { status, detail } => write!(f, "backend returned {}: {}", status, detail),
            FeedError::Decode(err) => write!(f, "invalid json: {}", err),
            FeedError::Envelope(msg) => write!(f, "unexpected payload: {}", msg),
        }
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FeedError::Http(err) => Some(err),
            FeedError::Decode(err) => Some(err),
            FeedError::Api { .. } | FeedError::Envelope(_) => None,
        }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Http(err)
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Decode(err)
    }
}
