//! Record fixtures and orchestrator helpers.
//!
//! Provides a correspondence document record type, its filter, and
//! convenience constructors wiring them to an in-memory service.

use recordsync_cache::{CacheConfig, EntityCache, Filter, Record};
use recordsync_engine::{MemoryRecordService, SyncOptions, SyncOrchestrator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A correspondence document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier.
    pub id: u64,
    /// Reference number.
    #[serde(default)]
    pub reference: String,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Workflow status.
    #[serde(default)]
    pub status: String,
}

impl Record for Document {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }
}

/// Filter for [`Document`] lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFilter {
    /// Free-text search.
    #[serde(default)]
    pub search: String,
    /// Status to match exactly; empty matches all.
    #[serde(default)]
    pub status: String,
}

impl DocumentFilter {
    /// Creates a filter with only a search term.
    pub fn matching(term: impl Into<String>) -> Self {
        Self {
            search: term.into(),
            status: String::new(),
        }
    }
}

impl Filter for DocumentFilter {
    fn search(&self) -> &str {
        &self.search
    }
}

/// Creates the document with the given id.
pub fn document(id: u64) -> Document {
    Document {
        id,
        reference: format!("REF/{id:04}"),
        subject: format!("Document {id}"),
        status: "draft".into(),
    }
}

/// Creates documents `1..=count`.
pub fn documents(count: u64) -> Vec<Document> {
    (1..=count).map(document).collect()
}

/// Creates a service holding documents `1..=count`.
pub fn document_service(count: u64) -> Arc<MemoryRecordService<Document>> {
    Arc::new(
        MemoryRecordService::new()
            .with_records(documents(count))
            .with_next_id(count + 1),
    )
}

/// Creates an empty document cache with the given page size.
pub fn document_cache(page_size: u32) -> Arc<EntityCache<Document, DocumentFilter>> {
    Arc::new(EntityCache::new(
        CacheConfig::new(DocumentFilter::default()).with_page_size(page_size),
    ))
}

/// Creates an orchestrator over a service seeded with `count` documents.
pub fn document_orchestrator(
    count: u64,
    page_size: u32,
) -> (
    Arc<MemoryRecordService<Document>>,
    SyncOrchestrator<Document, DocumentFilter>,
) {
    let service = document_service(count);
    let orchestrator = SyncOrchestrator::new(
        document_cache(page_size),
        Arc::clone(&service),
        service.mutations(),
        SyncOptions::default(),
    );
    (service, orchestrator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_are_sequential() {
        let docs = documents(3);
        assert_eq!(docs.iter().map(|d| d.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(docs[0].reference, "REF/0001");
    }

    #[test]
    fn orchestrator_starts_empty() {
        let (service, orchestrator) = document_orchestrator(5, 2);
        assert_eq!(service.len(), 5);
        assert!(orchestrator.items().is_empty());
        assert_eq!(orchestrator.pagination().limit, 2);
    }
}
