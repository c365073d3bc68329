//! Property tests for list result reconciliation.

use proptest::prelude::*;
use recordsync_cache::{CacheState, Pagination, PaginationPatch};
use recordsync_engine::{QueryState, SyncOrchestrator};
use recordsync_protocol::ListEnvelope;
use recordsync_testkit::prelude::*;

type Snapshot = (
    Vec<Document>,
    Option<Document>,
    DocumentFilter,
    Pagination,
    bool,
);

fn comparable(state: CacheState<Document, DocumentFilter>) -> Snapshot {
    (
        state.items,
        state.selected_item,
        state.filters,
        state.pagination,
        state.loading,
    )
}

/// An orchestrator whose cache already holds a page, a selection and totals.
fn primed(page: u32) -> SyncOrchestrator<Document, DocumentFilter> {
    let (_, orchestrator) = document_orchestrator(0, 10);
    let cache = orchestrator.cache();
    cache.set_items(documents(3));
    cache.set_selected_item(Some(document(2)));
    cache.set_pagination(PaginationPatch::new().page(page).totals(30, 3));
    orchestrator
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn test_reconcile_twice_matches_once(envelope in envelope_strategy(), page in 1u32..5) {
        let once = primed(page);
        once.reconcile(&envelope);

        let twice = primed(page);
        twice.reconcile(&envelope);
        twice.reconcile(&envelope);

        prop_assert_eq!(
            comparable(once.cache().snapshot()),
            comparable(twice.cache().snapshot())
        );
        prop_assert_eq!(twice.pagination().page, page);
    }

    #[test]
    fn test_observing_equal_results_matches_once(envelope in envelope_strategy(), page in 1u32..5) {
        let once = primed(page);
        once.observe_query(QueryState::resolved(envelope.clone()));

        let twice = primed(page);
        twice.observe_query(QueryState::resolved(envelope.clone()));
        twice.observe_query(QueryState::resolved(envelope.clone()));

        prop_assert_eq!(
            comparable(once.cache().snapshot()),
            comparable(twice.cache().snapshot())
        );
        prop_assert_eq!(twice.items(), envelope.items);
    }
}

#[test]
fn test_reconcile_keeps_totals_without_server_pagination() {
    let orchestrator = primed(2);
    orchestrator.reconcile(&ListEnvelope::new(vec![document(7)]));
    orchestrator.reconcile(&ListEnvelope::new(vec![document(7)]));

    let pagination = orchestrator.pagination();
    assert_eq!(orchestrator.items(), vec![document(7)]);
    assert_eq!((pagination.page, pagination.total, pagination.total_pages), (2, 30, 3));
}
