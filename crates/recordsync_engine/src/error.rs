//! Error types for the sync engine.

use recordsync_protocol::ProtocolError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// HTTP status the server uses to signal a stale anti-replay token.
pub const STALE_TOKEN_STATUS: u16 = 403;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Network failure without an HTTP status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with an error status.
    #[error("http {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// The token endpoint replied without a usable token.
    #[error("invalid token response")]
    InvalidTokenResponse,

    /// A protected call replied with `success: false`.
    #[error("{message}")]
    RequestFailed {
        /// Server-supplied message, or a generic default.
        message: String,
    },

    /// Malformed message body.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A list or detail query failed.
    #[error("query failed: {0}")]
    Query(String),

    /// A create, update or delete mutation failed.
    #[error("mutation failed: {0}")]
    Mutation(String),
}

impl SyncError {
    /// Creates an HTTP status error.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a semantic failure with the server's message, or the generic
    /// default if none was given.
    pub fn request_failed(message: Option<String>) -> Self {
        Self::RequestFailed {
            message: message.unwrap_or_else(|| "Request failed".into()),
        }
    }

    /// Returns the HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if this error signals a stale anti-replay token.
    pub fn is_stale_token(&self) -> bool {
        self.status() == Some(STALE_TOKEN_STATUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_token_detection() {
        assert!(SyncError::http(403, "forbidden").is_stale_token());
        assert!(!SyncError::http(401, "unauthorized").is_stale_token());
        assert!(!SyncError::Transport("reset".into()).is_stale_token());
        assert!(!SyncError::request_failed(None).is_stale_token());
    }

    #[test]
    fn request_failed_default_message() {
        assert_eq!(SyncError::request_failed(None).to_string(), "Request failed");
        assert_eq!(
            SyncError::request_failed(Some("Duplicate reference number".into())).to_string(),
            "Duplicate reference number"
        );
    }

    #[test]
    fn error_display() {
        let err = SyncError::http(500, "boom");
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("500"));
        assert_eq!(SyncError::InvalidTokenResponse.to_string(), "invalid token response");
    }
}
