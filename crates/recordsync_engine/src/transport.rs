//! Transport layer abstraction.
//!
//! The engine never talks to the network itself. Callers provide an
//! [`HttpClient`] that sends a POST and resolves with the parsed response
//! body, or fails with a [`SyncError`] carrying the HTTP status.

use crate::error::SyncResult;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual transport. `path` is relative
/// to the client's own base address. Error statuses must be reported as
/// [`SyncError::Http`](crate::SyncError::Http) so the stale-token signal can
/// be recognised.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a POST request and returns the parsed response body.
    ///
    /// `None` sends an empty body.
    async fn post(&self, path: &str, body: Option<Value>) -> SyncResult<Value>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for Arc<C> {
    async fn post(&self, path: &str, body: Option<Value>) -> SyncResult<Value> {
        (**self).post(path, body).await
    }
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer: Send + Sync {
    /// Handles a POST request and returns the response body.
    fn handle_post(&self, path: &str, body: Option<Value>) -> SyncResult<Value>;
}

/// An HTTP client that routes requests directly to an in-process server.
///
/// Useful for demos and tests without network overhead.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer> LoopbackClient<S> {
    /// Creates a loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }

    /// Returns the server.
    pub fn server(&self) -> &S {
        &self.server
    }
}

#[async_trait]
impl<S: LoopbackServer> HttpClient for LoopbackClient<S> {
    async fn post(&self, path: &str, body: Option<Value>) -> SyncResult<Value> {
        self.server.handle_post(path, body)
    }
}
