//! Single-record detail synchronization.
//!
//! A [`DetailSync`] writes each resolved detail record into the cache's
//! selection, and reads back "query result if present, else the cached
//! selection" so a detail view can show the last known value while a fresh
//! fetch is in flight.

use crate::error::SyncResult;
use crate::query::DetailQuery;
use parking_lot::RwLock;
use recordsync_cache::{EntityCache, Filter, Record};
use std::sync::Arc;
use tracing::debug;

/// Observable state of a detail query.
#[derive(Debug, Clone)]
pub struct DetailState<R> {
    /// Latest resolved record. `None` before the first fetch, or when the
    /// record was not found.
    pub data: Option<R>,
    /// Whether a fetch is in flight.
    pub loading: bool,
    /// Message of the latest failure.
    pub error: Option<String>,
}

impl<R> Default for DetailState<R> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

/// Binds a detail query to an [`EntityCache`]'s selection.
pub struct DetailSync<R: Record, F: Filter> {
    cache: Arc<EntityCache<R, F>>,
    query: Box<dyn DetailQuery<R>>,
    state: RwLock<DetailState<R>>,
}

impl<R: Record, F: Filter> DetailSync<R, F> {
    /// Creates a detail synchronizer.
    pub fn new(cache: Arc<EntityCache<R, F>>, query: impl DetailQuery<R> + 'static) -> Self {
        Self {
            cache,
            query: Box::new(query),
            state: RwLock::new(DetailState::default()),
        }
    }

    /// Returns the cache.
    pub fn cache(&self) -> &Arc<EntityCache<R, F>> {
        &self.cache
    }

    /// Returns the query result if present, else the cached selection.
    pub fn data(&self) -> Option<R> {
        self.state
            .read()
            .data
            .clone()
            .or_else(|| self.cache.selected_item())
    }

    /// Returns true while a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    /// Returns the latest failure message.
    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    /// Returns a snapshot of the query state.
    pub fn state(&self) -> DetailState<R> {
        self.state.read().clone()
    }

    /// Feeds a resolved detail result. A record is written into the
    /// cache's selection; `None` leaves the selection as it is.
    pub fn observe(&self, data: Option<R>) {
        if let Some(record) = &data {
            debug!(key = ?record.key(), "detail: selecting fetched record");
            self.cache.set_selected_item(Some(record.clone()));
        }
        let mut state = self.state.write();
        state.data = data;
        state.loading = false;
        state.error = None;
    }

    /// Fetches the record with `key` and observes the result.
    ///
    /// On failure the previous data and the cache are kept and the error
    /// is returned.
    pub async fn load(&self, key: &R::Key) -> SyncResult<Option<R>> {
        self.state.write().loading = true;
        match self.query.fetch(key).await {
            Ok(data) => {
                self.observe(data.clone());
                Ok(data)
            }
            Err(e) => {
                let mut state = self.state.write();
                state.loading = false;
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRecordService;
    use crate::testing::{letter, Letter, LetterFilter};
    use recordsync_cache::CacheConfig;

    fn setup() -> (Arc<MemoryRecordService<Letter>>, DetailSync<Letter, LetterFilter>) {
        let service = Arc::new(MemoryRecordService::new().with_records(vec![letter(1), letter(2)]));
        let cache = Arc::new(EntityCache::new(CacheConfig::default()));
        let detail = DetailSync::new(cache, Arc::clone(&service));
        (service, detail)
    }

    #[test]
    fn data_falls_back_to_selection() {
        let (_, detail) = setup();
        assert!(detail.data().is_none());
        detail.cache().set_selected_item(Some(letter(2)));
        assert_eq!(detail.data(), Some(letter(2)));
    }

    #[tokio::test]
    async fn load_selects_record() {
        let (_, detail) = setup();
        detail.cache().set_selected_item(Some(letter(2)));

        let loaded = detail.load(&1).await.unwrap();
        assert_eq!(loaded, Some(letter(1)));
        assert_eq!(detail.cache().selected_item(), Some(letter(1)));
        assert_eq!(detail.data(), Some(letter(1)));
        assert!(!detail.is_loading());
    }

    #[tokio::test]
    async fn not_found_keeps_selection() {
        let (_, detail) = setup();
        detail.cache().set_selected_item(Some(letter(2)));

        assert_eq!(detail.load(&99).await.unwrap(), None);
        assert_eq!(detail.cache().selected_item(), Some(letter(2)));
        assert_eq!(detail.data(), Some(letter(2)));
    }

    #[tokio::test]
    async fn failure_keeps_previous_data() {
        let (service, detail) = setup();
        detail.load(&1).await.unwrap();
        service.fail_next("timeout");

        assert!(detail.load(&2).await.is_err());
        assert_eq!(detail.data(), Some(letter(1)));
        assert!(detail.error().unwrap().contains("timeout"));
        assert!(!detail.is_loading());
    }
}
