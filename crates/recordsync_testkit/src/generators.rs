//! Property-based test generators using proptest.
//!
//! Provides strategies for documents, list results, and sequences of cache
//! operations.

use crate::fixtures::{Document, DocumentFilter};
use proptest::prelude::*;
use recordsync_cache::{EntityCache, FieldPatch, PaginationPatch};
use recordsync_protocol::ListEnvelope;

/// Default configuration for property tests in this workspace.
pub fn proptest_config() -> ProptestConfig {
    ProptestConfig::with_cases(128)
}

/// Strategy for generating document statuses.
pub fn status_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("draft".to_string()),
        Just("sent".to_string()),
        Just("received".to_string()),
        Just("archived".to_string()),
    ]
}

/// Strategy for generating documents with ids in `1..=max_id`.
pub fn document_strategy(max_id: u64) -> impl Strategy<Value = Document> {
    (
        1..=max_id,
        prop::string::string_regex("[A-Z]{2}/[0-9]{4}").expect("Invalid regex"),
        prop::string::string_regex("[a-zA-Z ]{0,24}").expect("Invalid regex"),
        status_strategy(),
    )
        .prop_map(|(id, reference, subject, status)| Document {
            id,
            reference,
            subject,
            status,
        })
}

/// Strategy for generating list results, with or without server totals.
pub fn envelope_strategy() -> impl Strategy<Value = ListEnvelope<Document>> {
    (
        prop::collection::vec(document_strategy(500), 0..20),
        proptest::option::of((0u64..10_000, 0u32..500)),
    )
        .prop_map(|(items, totals)| match totals {
            Some((total, pages)) => ListEnvelope::new(items).with_pagination(total, pages),
            None => ListEnvelope::new(items),
        })
}

/// One state-changing cache operation.
#[derive(Debug, Clone)]
pub enum CacheOp {
    /// `add_item`.
    Add(Document),
    /// `remove_item`.
    Remove(u64),
    /// `update_item` with a new status.
    Update(u64, String),
    /// `set_selected_item` with the cached record of that id.
    Select(u64),
    /// `set_filters` with a search term.
    Search(String),
    /// `set_pagination` with a page.
    Page(u32),
}

impl CacheOp {
    /// Applies the operation to `cache`.
    pub fn apply(&self, cache: &EntityCache<Document, DocumentFilter>) {
        match self {
            CacheOp::Add(doc) => cache.add_item(doc.clone()),
            CacheOp::Remove(id) => cache.remove_item(id),
            CacheOp::Update(id, status) => {
                cache.update_item(id, &FieldPatch::new().set("status", status.as_str()))
            }
            CacheOp::Select(id) => cache.set_selected_item(cache.get(id)),
            CacheOp::Search(term) => cache.set_filters(&FieldPatch::new().set("search", term.as_str())),
            CacheOp::Page(page) => cache.set_pagination(PaginationPatch::new().page(*page)),
        }
    }
}

/// Strategy for generating cache operations over ids in `1..=max_id`.
pub fn cache_op_strategy(max_id: u64) -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        document_strategy(max_id).prop_map(CacheOp::Add),
        (1..=max_id).prop_map(CacheOp::Remove),
        (1..=max_id, status_strategy()).prop_map(|(id, s)| CacheOp::Update(id, s)),
        (1..=max_id).prop_map(CacheOp::Select),
        prop::string::string_regex("[a-z]{0,8}")
            .expect("Invalid regex")
            .prop_map(CacheOp::Search),
        (1u32..50).prop_map(CacheOp::Page),
    ]
}
