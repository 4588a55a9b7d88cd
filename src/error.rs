//! Error taxonomy for the PolicyIntel client.

use thiserror::Error;

/// Errors that can occur in the client core.
#[derive(Debug, Error)]
pub enum Error {
    /// Client-side precondition failure. Never sent over the network.
    #[error("{0}")]
    Validation(String),

    /// Rejected credentials or failed authentication flow.
    #[error("{0}")]
    Auth(String),

    /// Network or protocol failure on an outbound call.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The configured base URL or a joined endpoint path is invalid.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// True when the error was raised before any network I/O.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
