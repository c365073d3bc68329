//! Replay-protected request client.
//!
//! Every protected call carries an anti-replay token. The token is fetched
//! lazily, cached, replaced whenever a response hands back a new one, and
//! refetched exactly once when the server rejects a call as stale (HTTP 403).
//!
//! ## Protocol
//!
//! ```text
//! Client                                 Server
//!   |                                      |
//!   |------ POST token_endpoint ---------->|
//!   |<----- {success, csrf_token} ---------|
//!   |                                      |
//!   |------ POST {action, csrf_token, data}>|
//!   |<----- {success, message?, data?, csrf_token?}
//!   |                                      |
//!   |   on 403: refetch token, send once more
//! ```

use crate::config::SecureClientConfig;
use crate::error::{SyncError, SyncResult};
use crate::transport::HttpClient;
use parking_lot::RwLock;
use recordsync_protocol::{ProtectedRequest, ProtectedResponse, ProtocolError, TokenResponse};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Counters kept by a [`SecureClient`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecureClientStats {
    /// Protected calls sent, retries included.
    pub requests: u64,
    /// Token endpoint calls.
    pub token_fetches: u64,
    /// Stale-token retries.
    pub retries: u64,
    /// Tokens replaced by a response.
    pub rotations: u64,
}

/// Sends replay-protected requests through an [`HttpClient`].
///
/// Construct one per application and share it; the cached token belongs to
/// the instance and is never persisted.
pub struct SecureClient<C: HttpClient> {
    config: SecureClientConfig,
    client: C,
    token: RwLock<Option<String>>,
    stats: RwLock<SecureClientStats>,
}

impl<C: HttpClient> SecureClient<C> {
    /// Creates a client with no cached token.
    pub fn new(config: SecureClientConfig, client: C) -> Self {
        Self {
            config,
            client,
            token: RwLock::new(None),
            stats: RwLock::new(SecureClientStats::default()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SecureClientConfig {
        &self.config
    }

    /// Returns the transport.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the cached token.
    pub fn cached_token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Forgets the cached token; the next call fetches a new one.
    pub fn clear_token(&self) {
        *self.token.write() = None;
    }

    /// Returns the client's counters.
    pub fn stats(&self) -> SecureClientStats {
        *self.stats.read()
    }

    /// Turns an absolute or API-rooted endpoint into a path relative to
    /// the transport's base address.
    pub fn normalize_endpoint(&self, endpoint: &str) -> String {
        let relative = strip_segment_prefix(endpoint, &self.config.base_url)
            .or_else(|| strip_segment_prefix(endpoint, &self.config.api_root))
            .unwrap_or(endpoint);
        if relative.starts_with('/') {
            relative.to_string()
        } else {
            format!("/{relative}")
        }
    }

    /// Fetches a fresh token and caches it.
    pub async fn fetch_token(&self) -> SyncResult<String> {
        self.stats.write().token_fetches += 1;
        let raw = self.client.post(&self.config.token_endpoint, None).await?;
        let response = TokenResponse::decode(raw).map_err(|e| {
            debug!(error = %e, "token response did not decode");
            SyncError::InvalidTokenResponse
        })?;
        let token = response
            .token()
            .ok_or(SyncError::InvalidTokenResponse)?
            .to_string();
        debug!("fetched anti-replay token");
        *self.token.write() = Some(token.clone());
        Ok(token)
    }

    /// Returns the cached token, fetching one if none is cached.
    pub async fn ensure_token(&self) -> SyncResult<String> {
        let cached = self.token.read().clone();
        match cached {
            Some(token) => Ok(token),
            None => self.fetch_token().await,
        }
    }

    /// Sends a protected request and returns the response's `data`.
    ///
    /// A stale-token rejection is recovered once.
    pub async fn request(
        &self,
        endpoint: &str,
        action: &str,
        data: Option<Value>,
    ) -> SyncResult<Option<Value>> {
        self.request_with_retry(endpoint, action, data, true).await
    }

    /// Sends a protected request, recovering from a stale-token rejection
    /// only when `allow_retry` is set.
    pub async fn request_with_retry(
        &self,
        endpoint: &str,
        action: &str,
        data: Option<Value>,
        allow_retry: bool,
    ) -> SyncResult<Option<Value>> {
        let path = self.normalize_endpoint(endpoint);
        match self.send_protected(&path, action, data.clone()).await {
            Err(e) if allow_retry && e.is_stale_token() => {
                warn!(path = %path, action, "token rejected as stale, retrying once");
                self.stats.write().retries += 1;
                self.fetch_token().await?;
                self.send_protected(&path, action, data).await
            }
            result => result,
        }
    }

    /// Sends a protected request and decodes the response's `data` as `T`.
    ///
    /// A missing `data` decodes from `null`.
    pub async fn request_as<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        action: &str,
        data: Option<Value>,
    ) -> SyncResult<T> {
        let value = self.request(endpoint, action, data).await?;
        serde_json::from_value(value.unwrap_or(Value::Null))
            .map_err(|e| SyncError::Protocol(ProtocolError::Decode(e)))
    }

    async fn send_protected(
        &self,
        path: &str,
        action: &str,
        data: Option<Value>,
    ) -> SyncResult<Option<Value>> {
        let token = if self.config.skip_replay_protection {
            self.config.disabled_token.clone()
        } else {
            self.ensure_token().await?
        };

        self.stats.write().requests += 1;
        let body = ProtectedRequest::new(action, token, data).encode()?;
        let raw = self.client.post(path, Some(body)).await?;
        let response = ProtectedResponse::decode(raw)?;

        if let Some(next) = response.csrf_token {
            debug!(path, "server rotated anti-replay token");
            *self.token.write() = Some(next);
            self.stats.write().rotations += 1;
        }
        if !response.success {
            return Err(SyncError::request_failed(response.message));
        }
        Ok(response.data)
    }
}

/// Strips `prefix` when it is followed by a path boundary.
fn strip_segment_prefix<'a>(endpoint: &'a str, prefix: &str) -> Option<&'a str> {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return None;
    }
    let rest = endpoint.strip_prefix(prefix)?;
    (rest.is_empty() || rest.starts_with('/') || rest.starts_with('?')).then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Offline;

    #[async_trait]
    impl HttpClient for Offline {
        async fn post(&self, path: &str, _body: Option<Value>) -> SyncResult<Value> {
            Err(SyncError::Transport(format!("offline: {path}")))
        }
    }

    #[test]
    fn endpoint_normalization() {
        let secure = SecureClient::new(
            SecureClientConfig::new("https://records.example.gov/api"),
            Offline,
        );
        assert_eq!(
            secure.normalize_endpoint("https://records.example.gov/api/documents"),
            "/documents"
        );
        assert_eq!(secure.normalize_endpoint("/api/documents/7"), "/documents/7");
        assert_eq!(secure.normalize_endpoint("/documents"), "/documents");
        assert_eq!(secure.normalize_endpoint("documents"), "/documents");
        assert_eq!(secure.normalize_endpoint("/apiary"), "/apiary");
        assert_eq!(secure.normalize_endpoint("/api"), "/");
    }

    #[tokio::test]
    async fn offline_token_fetch_fails() {
        let secure = SecureClient::new(SecureClientConfig::new(""), Offline);
        let err = secure.ensure_token().await.unwrap_err();
        assert!(matches!(err, SyncError::Transport(_)));
        assert!(secure.cached_token().is_none());
    }
}
