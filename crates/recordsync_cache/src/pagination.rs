//! Pagination descriptor.

use serde::{Deserialize, Serialize};

/// Page position and server-reported totals for one record type.
///
/// `page` and `limit` are client inputs to the next list query. `total` and
/// `total_pages` are written back from the server after each list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page, 1-based.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Total number of records matching the current filter.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u32,
}

impl Pagination {
    /// Creates a descriptor positioned on page 1 with no totals.
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            total: 0,
            total_pages: 0,
        }
    }

    /// Returns true if the server reported a page after the current one.
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Returns true if the current page is not the first.
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Applies a patch in place.
    pub fn apply(&mut self, patch: &PaginationPatch) {
        if let Some(page) = patch.page {
            self.page = page;
        }
        if let Some(limit) = patch.limit {
            self.limit = limit;
        }
        if let Some(total) = patch.total {
            self.total = total;
        }
        if let Some(total_pages) = patch.total_pages {
            self.total_pages = total_pages;
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(20)
    }
}

/// A partial update to a [`Pagination`] descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationPatch {
    /// New page.
    pub page: Option<u32>,
    /// New page size.
    pub limit: Option<u32>,
    /// New total.
    pub total: Option<u64>,
    /// New page count.
    pub total_pages: Option<u32>,
}

impl PaginationPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page.
    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the page size.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets both server-reported totals.
    #[must_use]
    pub fn totals(mut self, total: u64, total_pages: u32) -> Self {
        self.total = Some(total);
        self.total_pages = Some(total_pages);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_descriptor() {
        let p = Pagination::default();
        assert_eq!(
            p,
            Pagination {
                page: 1,
                limit: 20,
                total: 0,
                total_pages: 0
            }
        );
        assert!(!p.has_next());
        assert!(!p.has_previous());
    }

    #[test]
    fn patch_is_shallow() {
        let mut p = Pagination::new(50);
        p.apply(&PaginationPatch::new().totals(120, 3));
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 50);
        assert_eq!(p.total, 120);
        assert_eq!(p.total_pages, 3);

        p.apply(&PaginationPatch::new().page(3));
        assert_eq!(p.total, 120);
        assert!(!p.has_next());
        assert!(p.has_previous());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(Pagination::new(10)).unwrap();
        assert_eq!(json["totalPages"], 0);
        assert_eq!(json["limit"], 10);
    }
}
