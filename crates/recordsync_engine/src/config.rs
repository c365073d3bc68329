//! Configuration for the orchestrator and the secure request client.

use crate::error::{SyncError, SyncResult};
use recordsync_cache::Record;
use recordsync_protocol::{ProtocolError, UpdatePayload};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

type UpdatePayloadFn<W> = Box<dyn Fn(&W, Value) -> SyncResult<Value> + Send + Sync>;
type StoreIdFn<W, K> = Box<dyn Fn(&W) -> K + Send + Sync>;
type ItemsFn<R> = Box<dyn Fn(Vec<R>) -> Vec<R> + Send + Sync>;

/// Per-record-type options for a [`SyncOrchestrator`](crate::SyncOrchestrator).
///
/// `W` is the identifier type callers pass to update and delete; it is the
/// record's own key unless a record type's wire identifier differs from its
/// cache key.
pub struct SyncOptions<R: Record, W = <R as Record>::Key> {
    /// Mirror the list query's loading flag into the cache.
    pub sync_loading: bool,
    /// Drop list results that resolve after a newer fetch was started.
    pub discard_stale_results: bool,
    build_update_payload: UpdatePayloadFn<W>,
    store_id_transform: StoreIdFn<W, R::Key>,
    items_transform: ItemsFn<R>,
}

impl<R: Record> SyncOptions<R>
where
    R::Key: Serialize,
{
    /// Creates the default options: loading mirrored, `{id, data}` update
    /// payloads, identity id and item transforms.
    pub fn new() -> Self {
        Self::with_store_id_transform(|id: &R::Key| id.clone())
    }
}

impl<R: Record> Default for SyncOptions<R>
where
    R::Key: Serialize,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record, W: Serialize + 'static> SyncOptions<R, W> {
    /// Creates default options for a record type whose wire identifier `W`
    /// must be converted before it can address the cache.
    pub fn with_store_id_transform(transform: impl Fn(&W) -> R::Key + Send + Sync + 'static) -> Self {
        Self {
            sync_loading: true,
            discard_stale_results: false,
            build_update_payload: Box::new(|id, data| {
                serde_json::to_value(UpdatePayload::new(id, data))
                    .map_err(|e| SyncError::Protocol(ProtocolError::Encode(e)))
            }),
            store_id_transform: Box::new(transform),
            items_transform: Box::new(|items| items),
        }
    }
}

impl<R: Record, W> SyncOptions<R, W> {
    /// Sets whether the query's loading flag is mirrored into the cache.
    pub fn with_sync_loading(mut self, sync_loading: bool) -> Self {
        self.sync_loading = sync_loading;
        self
    }

    /// Sets whether out-of-order list results are discarded.
    pub fn with_discard_stale_results(mut self, discard: bool) -> Self {
        self.discard_stale_results = discard;
        self
    }

    /// Sets the update payload builder.
    pub fn with_update_payload(
        mut self,
        build: impl Fn(&W, Value) -> SyncResult<Value> + Send + Sync + 'static,
    ) -> Self {
        self.build_update_payload = Box::new(build);
        self
    }

    /// Sets the transform applied to fetched items before they are cached.
    pub fn with_items_transform(
        mut self,
        transform: impl Fn(Vec<R>) -> Vec<R> + Send + Sync + 'static,
    ) -> Self {
        self.items_transform = Box::new(transform);
        self
    }

    pub(crate) fn update_payload(&self, id: &W, data: Value) -> SyncResult<Value> {
        (self.build_update_payload)(id, data)
    }

    pub(crate) fn store_id(&self, id: &W) -> R::Key {
        (self.store_id_transform)(id)
    }

    pub(crate) fn transform_items(&self, items: Vec<R>) -> Vec<R> {
        (self.items_transform)(items)
    }
}

impl<R: Record, W> fmt::Debug for SyncOptions<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOptions")
            .field("sync_loading", &self.sync_loading)
            .field("discard_stale_results", &self.discard_stale_results)
            .finish_non_exhaustive()
    }
}

/// Environment variable holding the server base URL.
pub const ENV_BASE_URL: &str = "RECORDSYNC_BASE_URL";
/// Environment variable holding the API root path.
pub const ENV_API_ROOT: &str = "RECORDSYNC_API_ROOT";
/// Environment variable that disables replay protection when truthy.
pub const ENV_SKIP_CSRF: &str = "RECORDSYNC_SKIP_CSRF";

/// Configuration for a [`SecureClient`](crate::SecureClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureClientConfig {
    /// Base URL the transport sends to (e.g. "https://records.example.gov/api").
    pub base_url: String,
    /// Path-rooted API prefix (e.g. "/api").
    pub api_root: String,
    /// Token endpoint, relative to the base URL.
    pub token_endpoint: String,
    /// Send the sentinel token instead of acquiring one.
    pub skip_replay_protection: bool,
    /// Sentinel token used when replay protection is skipped.
    pub disabled_token: String,
}

impl SecureClientConfig {
    /// Creates a configuration for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_root: "/api".into(),
            token_endpoint: "/csrf-token".into(),
            skip_replay_protection: false,
            disabled_token: "csrf-disabled".into(),
        }
    }

    /// Reads the configuration from the environment.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new(lookup(ENV_BASE_URL).unwrap_or_default());
        if let Some(root) = lookup(ENV_API_ROOT) {
            config.api_root = root;
        }
        config.skip_replay_protection = lookup(ENV_SKIP_CSRF).is_some_and(|v| parse_flag(&v));
        config
    }

    /// Sets the API root prefix.
    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into();
        self
    }

    /// Sets the token endpoint.
    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    /// Sets whether replay protection is skipped.
    pub fn with_skip_replay_protection(mut self, skip: bool) -> Self {
        self.skip_replay_protection = skip;
        self
    }

    /// Sets the sentinel token used when replay protection is skipped.
    pub fn with_disabled_token(mut self, token: impl Into<String>) -> Self {
        self.disabled_token = token.into();
        self
    }
}

impl Default for SecureClientConfig {
    fn default() -> Self {
        Self::new("")
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Vendor {
        id: u64,
        name: String,
    }

    impl Record for Vendor {
        type Key = u64;

        fn key(&self) -> u64 {
            self.id
        }
    }

    #[test]
    fn default_options() {
        let options: SyncOptions<Vendor> = SyncOptions::default();
        assert!(options.sync_loading);
        assert!(!options.discard_stale_results);
        assert_eq!(options.store_id(&9), 9);
        assert_eq!(
            options.update_payload(&9, json!({"name": "Acme"})).unwrap(),
            json!({"id": 9, "data": {"name": "Acme"}})
        );
        let items = vec![Vendor {
            id: 1,
            name: "a".into(),
        }];
        assert_eq!(options.transform_items(items).len(), 1);
    }

    #[test]
    fn custom_options() {
        let options = SyncOptions::<Vendor, String>::with_store_id_transform(|id: &String| {
            id.parse().unwrap_or_default()
        })
        .with_sync_loading(false)
        .with_update_payload(|id, data| Ok(json!({"vendor_id": id, "data": data})))
        .with_items_transform(|items: Vec<Vendor>| {
            items
                .into_iter()
                .map(|mut v| {
                    v.name = v.name.to_uppercase();
                    v
                })
                .collect()
        });

        assert!(!options.sync_loading);
        assert_eq!(options.store_id(&"42".to_string()), 42);
        assert_eq!(
            options.update_payload(&"42".to_string(), json!({})).unwrap(),
            json!({"vendor_id": "42", "data": {}})
        );
        let items = options.transform_items(vec![Vendor {
            id: 1,
            name: "acme".into(),
        }]);
        assert_eq!(items[0].name, "ACME");
    }

    #[test]
    fn secure_config_builder() {
        let config = SecureClientConfig::new("https://records.example.gov/api")
            .with_api_root("/v2")
            .with_token_endpoint("/token")
            .with_skip_replay_protection(true)
            .with_disabled_token("off");

        assert_eq!(config.base_url, "https://records.example.gov/api");
        assert_eq!(config.api_root, "/v2");
        assert_eq!(config.token_endpoint, "/token");
        assert!(config.skip_replay_protection);
        assert_eq!(config.disabled_token, "off");
    }

    #[test]
    fn secure_config_from_lookup() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_BASE_URL, "https://records.example.gov/api"),
            (ENV_SKIP_CSRF, " TRUE "),
        ]);
        let config = SecureClientConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.base_url, "https://records.example.gov/api");
        assert_eq!(config.api_root, "/api");
        assert!(config.skip_replay_protection);

        let config = SecureClientConfig::from_lookup(|_| None);
        assert_eq!(config, SecureClientConfig::default());
    }

    #[test]
    fn flag_parsing() {
        assert!(parse_flag("1"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }
}
