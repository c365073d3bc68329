//! Error types for the protocol crate.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while encoding or decoding protocol messages.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Failed to encode a message.
    #[error("encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Failed to decode a message.
    #[error("decoding failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// A value had the wrong JSON shape.
    #[error("invalid structure: {0}")]
    InvalidStructure(String),
}

impl ProtocolError {
    /// Creates an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProtocolError::invalid_structure("expected object");
        assert_eq!(err.to_string(), "invalid structure: expected object");
    }
}
