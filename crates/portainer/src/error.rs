//! Error types for Portainer API operations.

/// Result type alias for Portainer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to a Portainer instance.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Authentication against `/api/auth` failed.
    #[error("authentication failed for {host}: {message}")]
    Auth {
        /// Portainer host the login was attempted against.
        host: String,
        /// Error message.
        message: String,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// The API returned a body that could not be decoded.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {}", code),
                status: Some(code),
            },
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
