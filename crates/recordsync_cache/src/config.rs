//! Per-record-type cache configuration.

use crate::record::Filter;

/// Configuration used to create an [`EntityCache`](crate::EntityCache).
///
/// Each record type builds one of these at start-up. The initial filter is
/// also the value [`reset_filters`](crate::EntityCache::reset_filters)
/// restores.
#[derive(Debug, Clone)]
pub struct CacheConfig<F: Filter> {
    /// Filter the cache starts with and returns to on reset.
    pub initial_filter: F,
    /// Initial page size.
    pub page_size: u32,
}

impl<F: Filter> CacheConfig<F> {
    /// Creates a configuration with the default page size of 20.
    pub fn new(initial_filter: F) -> Self {
        Self {
            initial_filter,
            page_size: 20,
        }
    }

    /// Sets the initial page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

impl<F: Filter + Default> Default for CacheConfig<F> {
    fn default() -> Self {
        Self::new(F::default())
    }
}
