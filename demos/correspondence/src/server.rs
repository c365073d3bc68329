//! In-process registry server for protected workflow actions.

use crate::records::Document;
use parking_lot::Mutex;
use recordsync_engine::{LoopbackServer, MemoryRecordService, SyncError, SyncResult, STALE_TOKEN_STATUS};
use recordsync_protocol::{ProtectedRequest, ProtectedResponse, ProtocolError, TokenResponse};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

pub const TOKEN_PATH: &str = "/csrf-token";

/// Serves `/documents/workflow` behind a rotating anti-replay token.
pub struct RegistryServer {
    documents: Arc<MemoryRecordService<Document>>,
    token: Mutex<Option<String>>,
    issued: Mutex<u64>,
    enforce: bool,
}

impl RegistryServer {
    pub fn new(documents: Arc<MemoryRecordService<Document>>) -> Self {
        Self {
            documents,
            token: Mutex::new(None),
            issued: Mutex::new(0),
            enforce: true,
        }
    }

    /// Sets whether protected calls must carry the current token.
    pub fn enforcing(mut self, enforce: bool) -> Self {
        self.enforce = enforce;
        self
    }

    /// Drops the current token, as a session timeout would.
    pub fn expire_token(&self) {
        info!("server: token expired");
        *self.token.lock() = None;
    }

    fn issue(&self) -> String {
        let mut issued = self.issued.lock();
        *issued += 1;
        let token = format!("tok-{:03}", *issued);
        *self.token.lock() = Some(token.clone());
        token
    }

    fn transition(&self, request: &ProtectedRequest) -> SyncResult<ProtectedResponse> {
        let status = match request.action.as_str() {
            "dispatch" => "sent",
            "receive" => "received",
            "archive" => "archived",
            other => return Ok(ProtectedResponse::error(format!("Unknown action {other}"))),
        };
        let Some(id) = request.data.as_ref().and_then(|d| d.get("id")).cloned() else {
            return Ok(ProtectedResponse::error("Document id is required"));
        };
        match self
            .documents
            .update(json!({"id": id, "data": {"status": status}}))
        {
            Ok(updated) => {
                let updated = serde_json::to_value(updated)
                    .map_err(|e| SyncError::Protocol(ProtocolError::Encode(e)))?;
                Ok(ProtectedResponse::success(Some(updated)))
            }
            Err(e) if e.status() == Some(404) => Ok(ProtectedResponse::error("Document not found")),
            Err(e) => Err(e),
        }
    }
}

impl LoopbackServer for RegistryServer {
    fn handle_post(&self, path: &str, body: Option<Value>) -> SyncResult<Value> {
        if path == TOKEN_PATH {
            return Ok(TokenResponse::issued(self.issue()).encode()?);
        }
        if path != "/documents/workflow" {
            return Err(SyncError::http(404, format!("no route for {path}")));
        }

        let request = ProtectedRequest::decode(body.unwrap_or(Value::Null))?;
        let current = self.token.lock().clone();
        if self.enforce && current.as_deref() != Some(request.csrf_token.as_str()) {
            return Err(SyncError::http(STALE_TOKEN_STATUS, "CSRF token mismatch"));
        }

        let response = self.transition(&request)?.with_token(self.issue());
        Ok(response.encode()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records;

    fn server() -> RegistryServer {
        RegistryServer::new(records::service(records::documents().unwrap()))
    }

    #[test]
    fn dispatch_returns_updated_document() {
        let server = server();
        let request = ProtectedRequest::new("dispatch", "tok", Some(json!({"id": 1})));

        let response = server.transition(&request).unwrap();

        assert!(response.success);
        let data = response.data.unwrap();
        assert_eq!(data["id"], 1);
        assert_eq!(data["status"], "sent");
    }

    #[test]
    fn unknown_document_is_a_semantic_failure() {
        let server = server();
        let request = ProtectedRequest::new("archive", "tok", Some(json!({"id": 999})));

        let response = server.transition(&request).unwrap();

        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("Document not found"));
    }
}
