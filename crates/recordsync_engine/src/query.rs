//! Asynchronous list and detail queries.

use crate::error::SyncResult;
use async_trait::async_trait;
use recordsync_cache::Record;
use recordsync_protocol::{ListEnvelope, ListParams};
use std::sync::Arc;

/// A parameterized list query for one record type.
#[async_trait]
pub trait ListQuery<R: Record>: Send + Sync {
    /// Fetches one page of records.
    async fn fetch(&self, params: &ListParams) -> SyncResult<ListEnvelope<R>>;
}

#[async_trait]
impl<R: Record, Q: ListQuery<R> + ?Sized> ListQuery<R> for Arc<Q> {
    async fn fetch(&self, params: &ListParams) -> SyncResult<ListEnvelope<R>> {
        (**self).fetch(params).await
    }
}

/// A single-record query.
///
/// Not-found is `Ok(None)`, not an error.
#[async_trait]
pub trait DetailQuery<R: Record>: Send + Sync {
    /// Fetches the record with the given key.
    async fn fetch(&self, key: &R::Key) -> SyncResult<Option<R>>;
}

#[async_trait]
impl<R: Record, Q: DetailQuery<R> + ?Sized> DetailQuery<R> for Arc<Q> {
    async fn fetch(&self, key: &R::Key) -> SyncResult<Option<R>> {
        (**self).fetch(key).await
    }
}

/// Observable state of a list query.
///
/// `data` is shared so a change of result can be detected by identity:
/// reconciliation runs when a new result arrives, not when the same result
/// is observed again.
#[derive(Debug)]
pub struct QueryState<R> {
    /// Latest resolved result.
    pub data: Option<Arc<ListEnvelope<R>>>,
    /// Whether a fetch is in flight.
    pub loading: bool,
    /// Message of the latest failure, cleared by the next success.
    pub error: Option<String>,
}

impl<R> QueryState<R> {
    /// Creates a state holding a resolved result.
    pub fn resolved(data: ListEnvelope<R>) -> Self {
        Self {
            data: Some(Arc::new(data)),
            loading: false,
            error: None,
        }
    }

    /// Creates a state for a fetch in flight.
    pub fn loading() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }
}

impl<R> Clone for QueryState<R> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
        }
    }
}

impl<R> Default for QueryState<R> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}
