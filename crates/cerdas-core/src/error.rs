//! Error types for the cerdas client.

use thiserror::Error;

/// Result type alias using cerdas' Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cerdas client operations.
///
/// Superseded responses are not errors; see [`crate::Delivery::Stale`].
#[derive(Error, Debug)]
pub enum Error {
    /// Backend unreachable, connection reset, or request timed out
    #[error("Transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-2xx status and an `{error}` body
    #[error("Backend returned {status}: {message}")]
    Backend { status: u16, message: String },

    /// Document id absent from the catalog, or rejected by the backend as unknown
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation requires an active document but none is selected
    #[error("No active document")]
    NoActiveDocument,

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Preference store read/write failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for network-level failures (the "cannot reach backend" class).
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// True when the target id is unknown to the catalog or the backend.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// HTTP status carried by a backend error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Serialization(e.to_string())
        } else {
            Error::Transport(e.to_string())
        }
    }
}
