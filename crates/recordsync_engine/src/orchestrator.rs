//! Synchronization orchestrator.
//!
//! Binds one [`EntityCache`] to one list query and one set of mutations,
//! and exposes the same facade for every record type.
//!
//! ## Feedback loop
//!
//! The cache's filter and page position select the list query's
//! parameters, and the query's results are written back into the same
//! cache. Only the server totals are written back to pagination, never the
//! page or limit, so a result can never select a different query.

use crate::config::SyncOptions;
use crate::error::SyncResult;
use crate::mutation::MutationSet;
use crate::query::{ListQuery, QueryState};
use parking_lot::RwLock;
use recordsync_cache::{EntityCache, FieldPatch, Filter, Pagination, PaginationPatch, Record};
use recordsync_protocol::{ListEnvelope, ListParams};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Keeps an [`EntityCache`] in agreement with a list query and turns
/// mutations into cache-consistent operations.
///
/// Errors from the query and the mutations are returned unchanged. A failed
/// mutation never touches the cache.
pub struct SyncOrchestrator<R, F, W = <R as Record>::Key>
where
    R: Record,
    F: Filter,
    W: Send + Sync + 'static,
{
    cache: Arc<EntityCache<R, F>>,
    query: Box<dyn ListQuery<R>>,
    mutations: MutationSet<R, W>,
    options: SyncOptions<R, W>,
    query_state: RwLock<QueryState<R>>,
    in_flight: AtomicUsize,
    latest_fetch: AtomicU64,
}

impl<R, F, W> SyncOrchestrator<R, F, W>
where
    R: Record,
    F: Filter,
    W: Send + Sync + 'static,
{
    /// Creates an orchestrator.
    pub fn new(
        cache: Arc<EntityCache<R, F>>,
        query: impl ListQuery<R> + 'static,
        mutations: MutationSet<R, W>,
        options: SyncOptions<R, W>,
    ) -> Self {
        Self {
            cache,
            query: Box::new(query),
            mutations,
            options,
            query_state: RwLock::new(QueryState::default()),
            in_flight: AtomicUsize::new(0),
            latest_fetch: AtomicU64::new(0),
        }
    }

    /// Returns the cache.
    pub fn cache(&self) -> &Arc<EntityCache<R, F>> {
        &self.cache
    }

    /// Returns the options.
    pub fn options(&self) -> &SyncOptions<R, W> {
        &self.options
    }

    /// Returns the cached records.
    pub fn items(&self) -> Vec<R> {
        self.cache.items()
    }

    /// Returns the selected record.
    pub fn selected_item(&self) -> Option<R> {
        self.cache.selected_item()
    }

    /// Returns the active filter.
    pub fn filters(&self) -> F {
        self.cache.filters()
    }

    /// Returns the pagination descriptor.
    pub fn pagination(&self) -> Pagination {
        self.cache.pagination()
    }

    /// Returns a snapshot of the list query's state.
    pub fn query_state(&self) -> QueryState<R> {
        self.query_state.read().clone()
    }

    /// Returns true while the list query is fetching.
    pub fn is_loading(&self) -> bool {
        self.query_state.read().loading
    }

    /// Returns the list query's latest failure message.
    pub fn error(&self) -> Option<String> {
        self.query_state.read().error.clone()
    }

    /// Returns true while a create is pending.
    pub fn is_creating(&self) -> bool {
        self.mutations.create.is_pending()
    }

    /// Returns true while an update is pending.
    pub fn is_updating(&self) -> bool {
        self.mutations.update.is_pending()
    }

    /// Returns true while a delete is pending.
    pub fn is_deleting(&self) -> bool {
        self.mutations.delete.is_pending()
    }

    /// Returns the list query parameters selected by the cache:
    /// `{page, limit, ...filters}`.
    pub fn list_params(&self) -> SyncResult<ListParams> {
        let params = self
            .cache
            .with_state(|s| ListParams::new(s.pagination.page, s.pagination.limit, &s.filters))?;
        Ok(params)
    }

    /// Writes a list result into the cache.
    ///
    /// Items pass through the items transform and replace the collection.
    /// Server totals, when present, overwrite `total` and `total_pages`
    /// together; otherwise pagination is left untouched.
    pub fn reconcile(&self, envelope: &ListEnvelope<R>) {
        let items = self.options.transform_items(envelope.items.clone());
        debug!(count = items.len(), totals = ?envelope.pagination, "reconciling list result");
        self.cache.set_items(items);
        if let Some(totals) = envelope.pagination {
            self.cache
                .set_pagination(PaginationPatch::new().totals(totals.total, totals.total_pages));
        }
    }

    /// Feeds a new list query state.
    ///
    /// Reconciles when the state carries a result different from the one
    /// last observed, and mirrors the loading flag into the cache when it
    /// changes and loading sync is enabled. Feeding the same state twice is
    /// a no-op.
    pub fn observe_query(&self, next: QueryState<R>) {
        let (loading_changed, data_changed) = {
            let current = self.query_state.read();
            let data_changed = match (&current.data, &next.data) {
                (Some(old), Some(new)) => !Arc::ptr_eq(old, new),
                (None, Some(_)) => true,
                _ => false,
            };
            (current.loading != next.loading, data_changed)
        };

        if loading_changed && self.options.sync_loading {
            self.cache.set_loading(next.loading);
        }
        if data_changed {
            if let Some(data) = &next.data {
                self.reconcile(data);
            }
        }
        *self.query_state.write() = next;
    }

    /// Runs the list query with the cache's current parameters and
    /// reconciles the result.
    ///
    /// When stale results are discarded, a successful result that resolves
    /// after a newer fetch has started is dropped and `Ok(())` is returned.
    /// A stale failure is still returned to the caller; the cache is left
    /// alone either way.
    pub async fn refetch(&self) -> SyncResult<()> {
        let ticket = self.latest_fetch.fetch_add(1, Ordering::SeqCst) + 1;
        let params = self.list_params()?;

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.set_query_loading(true);

        let result = self.query.fetch(&params).await;

        let still_loading = self.in_flight.fetch_sub(1, Ordering::SeqCst) > 1;
        if self.options.discard_stale_results
            && ticket != self.latest_fetch.load(Ordering::SeqCst)
        {
            debug!(ticket, page = params.page, "discarding stale list result");
            self.set_query_loading(still_loading);
            return result.map(|_| ());
        }

        match result {
            Ok(envelope) => {
                self.observe_query(QueryState {
                    data: Some(Arc::new(envelope)),
                    loading: still_loading,
                    error: None,
                });
                Ok(())
            }
            Err(e) => {
                let mut next = self.query_state();
                next.loading = still_loading;
                next.error = Some(e.to_string());
                self.observe_query(next);
                Err(e)
            }
        }
    }

    fn set_query_loading(&self, loading: bool) {
        let mut next = self.query_state();
        next.loading = loading;
        self.observe_query(next);
    }

    /// Creates a record and prepends the stored result to the cache.
    pub async fn handle_create(&self, data: Value) -> SyncResult<Option<R>> {
        let created = self.mutations.create.invoke(data).await?;
        if let Some(record) = &created {
            self.cache.add_item(record.clone());
        }
        Ok(created)
    }

    /// Updates a record and merges the stored result into the cache.
    pub async fn handle_update(&self, id: &W, data: Value) -> SyncResult<Option<R>> {
        let payload = self.options.update_payload(id, data)?;
        let key = self.options.store_id(id);
        let updated = self.mutations.update.invoke(payload).await?;
        if let Some(record) = &updated {
            match FieldPatch::from_value(record) {
                Some(patch) => self.cache.update_item(&key, &patch),
                None => warn!(?key, "updated record is not an object, cache left as is"),
            }
        }
        Ok(updated)
    }

    /// Deletes a record and removes it from the cache.
    pub async fn handle_delete(&self, id: W) -> SyncResult<()> {
        let key = self.options.store_id(&id);
        self.mutations.delete.invoke(id).await?;
        self.cache.remove_item(&key);
        Ok(())
    }

    /// Moves to `page`, optionally changing the page size.
    pub fn set_page(&self, page: u32, page_size: Option<u32>) {
        let limit = page_size.unwrap_or_else(|| self.cache.pagination().limit);
        self.cache
            .set_pagination(PaginationPatch::new().page(page).limit(limit));
    }

    /// Moves to the next page if the server reported one. Returns whether
    /// the page changed.
    pub fn next_page(&self) -> bool {
        let pagination = self.cache.pagination();
        if pagination.has_next() {
            self.set_page(pagination.page + 1, None);
            true
        } else {
            false
        }
    }

    /// Moves to the previous page if there is one. Returns whether the page
    /// changed.
    pub fn previous_page(&self) -> bool {
        let pagination = self.cache.pagination();
        if pagination.has_previous() {
            self.set_page(pagination.page - 1, None);
            true
        } else {
            false
        }
    }

    /// Merges into the filter; the page returns to 1.
    pub fn set_filters(&self, patch: &FieldPatch) {
        self.cache.set_filters(patch);
    }

    /// Replaces the filter; the page returns to 1.
    pub fn replace_filters(&self, filters: F) {
        self.cache.replace_filters(filters);
    }

    /// Replaces the selection.
    pub fn select_item(&self, item: Option<R>) {
        self.cache.set_selected_item(item);
    }

    /// Restores the initial filter; the page returns to 1.
    pub fn reset_filters(&self) {
        self.cache.reset_filters();
    }
}
