//! HTTP test doubles for the replay-protected request protocol.
//!
//! [`ScriptedHttpClient`] replies from a fixed queue. [`ProtectedEndpoint`]
//! is a [`LoopbackServer`] that issues tokens, rejects stale ones with 403,
//! and can rotate the token on every response.

use async_trait::async_trait;
use parking_lot::Mutex;
use recordsync_engine::{HttpClient, LoopbackServer, SyncError, SyncResult, STALE_TOKEN_STATUS};
use recordsync_protocol::{ProtectedRequest, ProtectedResponse, TokenResponse};
use serde_json::{json, Value};
use std::collections::VecDeque;

/// A recorded POST.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Request path.
    pub path: String,
    /// Request body.
    pub body: Option<Value>,
}

/// An [`HttpClient`] that replies from a queue and records every call.
///
/// Once the queue is empty every call fails with a transport error.
#[derive(Default)]
pub struct ScriptedHttpClient {
    replies: Mutex<VecDeque<SyncResult<Value>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedHttpClient {
    /// Creates a client with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply.
    pub fn reply(self, body: Value) -> Self {
        self.replies.lock().push_back(Ok(body));
        self
    }

    /// Queues a failed reply with the given status.
    pub fn fail(self, status: u16, message: &str) -> Self {
        self.replies
            .lock()
            .push_back(Err(SyncError::http(status, message)));
        self
    }

    /// Queues a token endpoint reply issuing `token`.
    pub fn token(self, token: &str) -> Self {
        self.reply(json!({"success": true, "csrf_token": token}))
    }

    /// Queues a stale-token rejection.
    pub fn stale(self) -> Self {
        self.fail(STALE_TOKEN_STATUS, "CSRF token mismatch")
    }

    /// Returns every recorded call.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Returns how many calls went to `path`.
    pub fn calls_to(&self, path: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.path == path).count()
    }

    /// Returns how many replies are still queued.
    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn post(&self, path: &str, body: Option<Value>) -> SyncResult<Value> {
        self.calls.lock().push(RecordedCall {
            path: path.to_string(),
            body,
        });
        let next = self.replies.lock().pop_front();
        next.unwrap_or_else(|| Err(SyncError::Transport(format!("no scripted reply for {path}"))))
    }
}

#[derive(Debug, Default)]
struct EndpointState {
    current: Option<String>,
    issued: u64,
    accepted: Vec<ProtectedRequest>,
    rejected: usize,
}

/// An in-process endpoint speaking the replay-protected protocol.
///
/// Tokens are `token-1`, `token-2`, and so on. Only the latest token is
/// accepted. A protected request echoes `{action, data}` back as its
/// result, or fails semantically when its action is `"fail"`.
#[derive(Debug)]
pub struct ProtectedEndpoint {
    token_path: String,
    rotate: bool,
    state: Mutex<EndpointState>,
}

impl ProtectedEndpoint {
    /// Creates an endpoint serving tokens at `token_path`.
    pub fn new(token_path: impl Into<String>) -> Self {
        Self {
            token_path: token_path.into(),
            rotate: false,
            state: Mutex::default(),
        }
    }

    /// Hands back a fresh token with every protected response.
    pub fn rotating(mut self) -> Self {
        self.rotate = true;
        self
    }

    /// Invalidates the current token, as a server-side session expiry would.
    pub fn expire_token(&self) {
        self.state.lock().current = None;
    }

    /// Returns the number of tokens issued.
    pub fn tokens_issued(&self) -> u64 {
        self.state.lock().issued
    }

    /// Returns the accepted protected requests.
    pub fn accepted(&self) -> Vec<ProtectedRequest> {
        self.state.lock().accepted.clone()
    }

    /// Returns the number of requests rejected as stale.
    pub fn rejected(&self) -> usize {
        self.state.lock().rejected
    }

    fn issue(state: &mut EndpointState) -> String {
        state.issued += 1;
        let token = format!("token-{}", state.issued);
        state.current = Some(token.clone());
        token
    }
}

impl LoopbackServer for ProtectedEndpoint {
    fn handle_post(&self, path: &str, body: Option<Value>) -> SyncResult<Value> {
        let mut state = self.state.lock();
        if path == self.token_path {
            let token = Self::issue(&mut state);
            return Ok(TokenResponse::issued(token).encode()?);
        }

        let request = ProtectedRequest::decode(body.unwrap_or(Value::Null))?;
        if state.current.as_deref() != Some(request.csrf_token.as_str()) {
            state.rejected += 1;
            return Err(SyncError::http(STALE_TOKEN_STATUS, "CSRF token mismatch"));
        }

        let mut response = if request.action == "fail" {
            ProtectedResponse::error("Action rejected")
        } else {
            ProtectedResponse::success(Some(json!({
                "action": request.action,
                "data": request.data,
            })))
        };
        if self.rotate {
            response = response.with_token(Self::issue(&mut state));
        }
        state.accepted.push(request);
        Ok(response.encode()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_rejects_unknown_token() {
        let endpoint = ProtectedEndpoint::new("/csrf-token");
        let token = endpoint.handle_post("/csrf-token", None).unwrap();
        assert_eq!(token["csrf_token"], "token-1");

        let body = ProtectedRequest::new("approve", "token-0", None).encode().unwrap();
        let err = endpoint.handle_post("/documents", Some(body)).unwrap_err();
        assert!(err.is_stale_token());
        assert_eq!(endpoint.rejected(), 1);

        let body = ProtectedRequest::new("approve", "token-1", None).encode().unwrap();
        let ok = endpoint.handle_post("/documents", Some(body)).unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(endpoint.accepted().len(), 1);
    }

    #[tokio::test]
    async fn scripted_client_replays_in_order() {
        let client = ScriptedHttpClient::new().token("abc").stale();
        assert_eq!(client.post("/t", None).await.unwrap()["csrf_token"], "abc");
        assert_eq!(client.post("/p", None).await.unwrap_err().status(), Some(403));
        assert!(client.post("/p", None).await.is_err());
        assert_eq!(client.calls_to("/p"), 2);
        assert_eq!(client.remaining(), 0);
    }
}
