//! Replay-protected request messages.
//!
//! A client first obtains a token from the token endpoint, then sends it
//! with every protected request. Any response may hand back the next token
//! to use.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response of the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Whether the server issued a token.
    #[serde(default)]
    pub success: bool,
    /// The issued token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

impl TokenResponse {
    /// Creates a successful token response.
    pub fn issued(token: impl Into<String>) -> Self {
        Self {
            success: true,
            csrf_token: Some(token.into()),
        }
    }

    /// Returns the token if the response is successful and carries one.
    pub fn token(&self) -> Option<&str> {
        if self.success {
            self.csrf_token.as_deref()
        } else {
            None
        }
    }

    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Value> {
        serde_json::to_value(self).map_err(ProtocolError::Encode)
    }

    /// Decodes from JSON.
    pub fn decode(value: Value) -> ProtocolResult<Self> {
        serde_json::from_value(value).map_err(ProtocolError::Decode)
    }
}

/// Body of a protected request: `{action, csrf_token, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectedRequest {
    /// Server-side action name.
    pub action: String,
    /// Anti-replay token.
    pub csrf_token: String,
    /// Action arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProtectedRequest {
    /// Creates a protected request.
    pub fn new(action: impl Into<String>, csrf_token: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            action: action.into(),
            csrf_token: csrf_token.into(),
            data,
        }
    }

    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Value> {
        serde_json::to_value(self).map_err(ProtocolError::Encode)
    }

    /// Decodes from JSON.
    pub fn decode(value: Value) -> ProtocolResult<Self> {
        serde_json::from_value(value).map_err(ProtocolError::Decode)
    }
}

/// Response of a protected endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectedResponse {
    /// Whether the action succeeded.
    #[serde(default)]
    pub success: bool,
    /// Server message, usually set on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Action result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Next token to use, if the server rotated it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

impl ProtectedResponse {
    /// Creates a successful response.
    pub fn success(data: Option<Value>) -> Self {
        Self {
            success: true,
            message: None,
            data,
            csrf_token: None,
        }
    }

    /// Creates a failed response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            csrf_token: None,
        }
    }

    /// Attaches a rotated token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Value> {
        serde_json::to_value(self).map_err(ProtocolError::Encode)
    }

    /// Decodes from JSON.
    pub fn decode(value: Value) -> ProtocolResult<Self> {
        serde_json::from_value(value).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_requires_success() {
        let ok = TokenResponse::decode(json!({"success": true, "csrf_token": "abc"})).unwrap();
        assert_eq!(ok.token(), Some("abc"));

        let refused = TokenResponse::decode(json!({"success": false, "csrf_token": "abc"})).unwrap();
        assert_eq!(refused.token(), None);

        let empty = TokenResponse::decode(json!({"success": true})).unwrap();
        assert_eq!(empty.token(), None);

        let bare = TokenResponse::decode(json!({})).unwrap();
        assert!(!bare.success);
    }

    #[test]
    fn request_wire_shape() {
        let req = ProtectedRequest::new("archive", "tok", Some(json!({"id": 3})));
        assert_eq!(
            req.encode().unwrap(),
            json!({"action": "archive", "csrf_token": "tok", "data": {"id": 3}})
        );

        let bare = ProtectedRequest::new("ping", "tok", None);
        assert_eq!(
            bare.encode().unwrap(),
            json!({"action": "ping", "csrf_token": "tok"})
        );
    }

    #[test]
    fn response_defaults() {
        let resp = ProtectedResponse::decode(json!({"success": true, "data": "ok"})).unwrap();
        assert!(resp.success);
        assert_eq!(resp.data, Some(json!("ok")));
        assert!(resp.message.is_none());
        assert!(resp.csrf_token.is_none());

        let failed = ProtectedResponse::decode(json!({"message": "denied"})).unwrap();
        assert!(!failed.success);
        assert_eq!(failed.message.as_deref(), Some("denied"));
    }

    #[test]
    fn response_rejects_non_object() {
        assert!(matches!(
            ProtectedResponse::decode(json!("nope")),
            Err(ProtocolError::Decode(_))
        ));
    }

    #[test]
    fn response_builders() {
        let resp = ProtectedResponse::error("expired").with_token("next");
        assert_eq!(
            resp.encode().unwrap(),
            json!({"success": false, "message": "expired", "csrf_token": "next"})
        );
    }
}
