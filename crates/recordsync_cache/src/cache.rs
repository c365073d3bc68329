//! The entity cache state container.

use crate::config::CacheConfig;
use crate::pagination::{Pagination, PaginationPatch};
use crate::patch::FieldPatch;
use crate::record::{Filter, Record};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Snapshot of an [`EntityCache`].
#[derive(Debug, Clone)]
pub struct CacheState<R: Record, F: Filter> {
    /// Records on the current page, in display order.
    pub items: Vec<R>,
    /// The selected record, if any.
    pub selected_item: Option<R>,
    /// Active filter.
    pub filters: F,
    /// Page position and totals.
    pub pagination: Pagination,
    /// Cache-level loading indicator.
    pub loading: bool,
}

impl<R: Record, F: Filter> CacheState<R, F> {
    fn initial(config: &CacheConfig<F>) -> Self {
        Self {
            items: Vec::new(),
            selected_item: None,
            filters: config.initial_filter.clone(),
            pagination: Pagination::new(config.page_size),
            loading: false,
        }
    }
}

/// Observable cache of one record type's visible collection and selection.
///
/// One instance is created per record type and shared (usually behind an
/// `Arc`) for the lifetime of the application. State can only change
/// through the methods below; every change is published to subscribers.
///
/// No operation fails. Identifiers that match nothing are silent no-ops,
/// and a patch that cannot be merged into a record leaves that record as it
/// was.
pub struct EntityCache<R: Record, F: Filter> {
    config: CacheConfig<F>,
    state: watch::Sender<CacheState<R, F>>,
}

impl<R: Record, F: Filter> EntityCache<R, F> {
    /// Creates a cache from its record type's configuration.
    pub fn new(config: CacheConfig<F>) -> Self {
        let (state, _) = watch::channel(CacheState::initial(&config));
        Self { config, state }
    }

    /// Returns the configuration the cache was created with.
    pub fn config(&self) -> &CacheConfig<F> {
        &self.config
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<CacheState<R, F>> {
        self.state.subscribe()
    }

    /// Returns a snapshot of the whole state.
    pub fn snapshot(&self) -> CacheState<R, F> {
        self.state.borrow().clone()
    }

    /// Runs `f` against the current state without cloning it.
    pub fn with_state<T>(&self, f: impl FnOnce(&CacheState<R, F>) -> T) -> T {
        f(&self.state.borrow())
    }

    /// Returns the cached records.
    pub fn items(&self) -> Vec<R> {
        self.state.borrow().items.clone()
    }

    /// Returns the number of cached records.
    pub fn len(&self) -> usize {
        self.state.borrow().items.len()
    }

    /// Returns true if no records are cached.
    pub fn is_empty(&self) -> bool {
        self.state.borrow().items.is_empty()
    }

    /// Returns the record with the given key, if cached.
    pub fn get(&self, key: &R::Key) -> Option<R> {
        self.state
            .borrow()
            .items
            .iter()
            .find(|item| item.key() == *key)
            .cloned()
    }

    /// Returns the selected record.
    pub fn selected_item(&self) -> Option<R> {
        self.state.borrow().selected_item.clone()
    }

    /// Returns the active filter.
    pub fn filters(&self) -> F {
        self.state.borrow().filters.clone()
    }

    /// Returns the pagination descriptor.
    pub fn pagination(&self) -> Pagination {
        self.state.borrow().pagination
    }

    /// Returns the cache-level loading flag.
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Replaces the collection wholesale.
    pub fn set_items(&self, items: Vec<R>) {
        debug!(count = items.len(), "cache: set items");
        self.state.send_modify(|s| s.items = items);
    }

    /// Replaces the selection.
    pub fn set_selected_item(&self, item: Option<R>) {
        self.state.send_modify(|s| s.selected_item = item);
    }

    /// Prepends a record and counts it in the total.
    pub fn add_item(&self, item: R) {
        debug!(key = ?item.key(), "cache: add item");
        self.state.send_modify(|s| {
            s.items.insert(0, item);
            s.pagination.total = s.pagination.total.saturating_add(1);
        });
    }

    /// Merges `patch` into every record whose key matches, and into the
    /// selection if its key matches.
    pub fn update_item(&self, key: &R::Key, patch: &FieldPatch) {
        self.state.send_modify(|s| {
            for item in s.items.iter_mut().filter(|item| item.key() == *key) {
                merge_in_place(item, patch);
            }
            if let Some(selected) = s.selected_item.as_mut().filter(|sel| sel.key() == *key) {
                merge_in_place(selected, patch);
            }
        });
    }

    /// Removes the record with the given key and decrements the total.
    ///
    /// The total is decremented (floored at zero) whether or not a record
    /// matched.
    pub fn remove_item(&self, key: &R::Key) {
        debug!(?key, "cache: remove item");
        self.state.send_modify(|s| {
            s.items.retain(|item| item.key() != *key);
            s.pagination.total = s.pagination.total.saturating_sub(1);
            if s
                .selected_item
                .as_ref()
                .is_some_and(|selected| selected.key() == *key)
            {
                s.selected_item = None;
            }
        });
    }

    /// Merges `patch` into the filter and returns to page 1.
    pub fn set_filters(&self, patch: &FieldPatch) {
        self.state.send_modify(|s| {
            match patch.merged(&s.filters) {
                Ok(filters) => s.filters = filters,
                Err(e) => warn!(error = %e, "cache: filter patch not applied"),
            }
            s.pagination.page = 1;
        });
    }

    /// Replaces the filter and returns to page 1.
    pub fn replace_filters(&self, filters: F) {
        self.state.send_modify(|s| {
            s.filters = filters;
            s.pagination.page = 1;
        });
    }

    /// Merges `patch` into the pagination descriptor.
    pub fn set_pagination(&self, patch: PaginationPatch) {
        self.state.send_modify(|s| s.pagination.apply(&patch));
    }

    /// Restores the configured initial filter and returns to page 1.
    pub fn reset_filters(&self) {
        let initial = self.config.initial_filter.clone();
        self.replace_filters(initial);
    }

    /// Sets the cache-level loading flag.
    pub fn set_loading(&self, loading: bool) {
        self.state.send_if_modified(|s| {
            let changed = s.loading != loading;
            s.loading = loading;
            changed
        });
    }

    /// Restores every field to its initial value.
    pub fn clear_all(&self) {
        debug!("cache: clear all");
        self.state.send_replace(CacheState::initial(&self.config));
    }
}

fn merge_in_place<T>(target: &mut T, patch: &FieldPatch)
where
    T: Record,
{
    match patch.merged(&*target) {
        Ok(merged) => *target = merged,
        Err(e) => warn!(key = ?target.key(), error = %e, "cache: record patch not applied"),
    }
}
