//! In-memory record service.
//!
//! Serves list, detail, create, update and delete for one record type from
//! a `Vec` in memory, the way a REST endpoint would. Useful for demos and
//! tests.

use crate::error::{SyncError, SyncResult};
use crate::mutation::{Mutation, MutationSet};
use crate::query::{DetailQuery, ListQuery};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use recordsync_cache::{FieldPatch, Record};
use recordsync_protocol::{ListEnvelope, ListParams};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// An in-memory backend for one record type.
///
/// New records get sequential numeric identifiers written into `id_field`.
/// Updates expect the `{<id_field>, data}` payload shape.
pub struct MemoryRecordService<R: Record> {
    records: RwLock<Vec<R>>,
    next_id: AtomicU64,
    id_field: String,
    failure: Mutex<Option<String>>,
    list_calls: AtomicUsize,
}

impl<R: Record> MemoryRecordService<R> {
    /// Creates an empty service using `id` as the identifier field.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            id_field: "id".into(),
            failure: Mutex::new(None),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// Sets the identifier field name.
    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Adds existing records. Identifiers are taken as given; new records
    /// are numbered after `next_id`.
    pub fn with_records(self, records: Vec<R>) -> Self {
        self.records.write().extend(records);
        self
    }

    /// Sets the next identifier handed out by create.
    pub fn with_next_id(self, next_id: u64) -> Self {
        self.next_id.store(next_id, Ordering::SeqCst);
        self
    }

    /// Returns every stored record.
    pub fn records(&self) -> Vec<R> {
        self.records.read().clone()
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Returns how many list queries have been served.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Makes the next operation fail with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(message.into());
    }

    fn take_failure(&self) -> Option<String> {
        self.failure.lock().take()
    }

    /// Serves one page of records matching the parameters.
    pub fn list(&self, params: &ListParams) -> SyncResult<ListEnvelope<R>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.take_failure() {
            return Err(SyncError::Query(message));
        }

        let matching: Vec<R> = self
            .records
            .read()
            .iter()
            .filter(|record| matches_params(*record, params))
            .cloned()
            .collect();

        let limit = params.limit.max(1);
        let total = matching.len() as u64;
        let total_pages = total.div_ceil(u64::from(limit)) as u32;
        let skip = (params.page.saturating_sub(1) as usize).saturating_mul(limit as usize);
        let items = matching.into_iter().skip(skip).take(limit as usize).collect();

        Ok(ListEnvelope::new(items).with_pagination(total, total_pages))
    }

    /// Returns the record with the given key.
    pub fn get(&self, key: &R::Key) -> SyncResult<Option<R>> {
        if let Some(message) = self.take_failure() {
            return Err(SyncError::Query(message));
        }
        Ok(self
            .records
            .read()
            .iter()
            .find(|record| record.key() == *key)
            .cloned())
    }

    /// Creates a record from a JSON object and stores it first.
    pub fn create(&self, data: Value) -> SyncResult<Option<R>> {
        if let Some(message) = self.take_failure() {
            return Err(SyncError::Mutation(message));
        }
        let Value::Object(mut fields) = data else {
            return Err(SyncError::Mutation("create payload must be an object".into()));
        };
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        fields.insert(self.id_field.clone(), Value::from(id));
        let record: R = serde_json::from_value(Value::Object(fields))
            .map_err(|e| SyncError::Mutation(format!("invalid record: {e}")))?;
        self.records.write().insert(0, record.clone());
        Ok(Some(record))
    }

    /// Applies an `{<id_field>, data}` payload and returns the updated record.
    pub fn update(&self, payload: Value) -> SyncResult<Option<R>> {
        if let Some(message) = self.take_failure() {
            return Err(SyncError::Mutation(message));
        }
        let id = payload
            .get(&self.id_field)
            .cloned()
            .ok_or_else(|| SyncError::Mutation(format!("update payload lacks {}", self.id_field)))?;
        let patch = match payload.get("data") {
            Some(Value::Object(map)) => FieldPatch::from(map.clone()),
            _ => return Err(SyncError::Mutation("update payload lacks data".into())),
        };

        let mut records = self.records.write();
        let record = records
            .iter_mut()
            .find(|record| field_of(&**record, &self.id_field).is_some_and(|v| same_id(&v, &id)))
            .ok_or_else(|| SyncError::http(404, "record not found"))?;
        let updated: R = patch
            .merged(&*record)
            .map_err(|e| SyncError::Mutation(format!("invalid update: {e}")))?;
        *record = updated.clone();
        Ok(Some(updated))
    }

    /// Deletes the record with the given key. Deleting a missing record
    /// succeeds.
    pub fn delete(&self, key: &R::Key) -> SyncResult<()> {
        if let Some(message) = self.take_failure() {
            return Err(SyncError::Mutation(message));
        }
        self.records.write().retain(|record| record.key() != *key);
        Ok(())
    }

    /// Returns create, update and delete mutations backed by this service.
    pub fn mutations(self: &Arc<Self>) -> MutationSet<R> {
        MutationSet::new(
            CreateRecord(Arc::clone(self)),
            UpdateRecord(Arc::clone(self)),
            DeleteRecord(Arc::clone(self)),
        )
    }
}

impl<R: Record> Default for MemoryRecordService<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn as_object<R: Record>(record: &R) -> Map<String, Value> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn field_of<R: Record>(record: &R, field: &str) -> Option<Value> {
    as_object(record).remove(field)
}

fn same_id(a: &Value, b: &Value) -> bool {
    a == b || id_text(a).is_some_and(|a| id_text(b).is_some_and(|b| a == b))
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn matches_params<R: Record>(record: &R, params: &ListParams) -> bool {
    let fields = as_object(record);

    if let Some(term) = params.search() {
        let term = term.to_lowercase();
        let hit = fields
            .values()
            .filter_map(Value::as_str)
            .any(|text| text.to_lowercase().contains(&term));
        if !hit {
            return false;
        }
    }

    params
        .filters
        .iter()
        .filter(|(name, value)| name.as_str() != "search" && !is_blank(value))
        .all(|(name, wanted)| match fields.get(name) {
            Some(actual) => actual == wanted,
            None => true,
        })
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[async_trait]
impl<R: Record> ListQuery<R> for MemoryRecordService<R> {
    async fn fetch(&self, params: &ListParams) -> SyncResult<ListEnvelope<R>> {
        self.list(params)
    }
}

#[async_trait]
impl<R: Record> DetailQuery<R> for MemoryRecordService<R> {
    async fn fetch(&self, key: &R::Key) -> SyncResult<Option<R>> {
        self.get(key)
    }
}

/// Create mutation backed by a [`MemoryRecordService`].
pub struct CreateRecord<R: Record>(pub Arc<MemoryRecordService<R>>);

#[async_trait]
impl<R: Record> Mutation<Value, Option<R>> for CreateRecord<R> {
    async fn invoke(&self, input: Value) -> SyncResult<Option<R>> {
        self.0.create(input)
    }
}

/// Update mutation backed by a [`MemoryRecordService`].
pub struct UpdateRecord<R: Record>(pub Arc<MemoryRecordService<R>>);

#[async_trait]
impl<R: Record> Mutation<Value, Option<R>> for UpdateRecord<R> {
    async fn invoke(&self, input: Value) -> SyncResult<Option<R>> {
        self.0.update(input)
    }
}

/// Delete mutation backed by a [`MemoryRecordService`].
pub struct DeleteRecord<R: Record>(pub Arc<MemoryRecordService<R>>);

#[async_trait]
impl<R: Record> Mutation<R::Key, ()> for DeleteRecord<R> {
    async fn invoke(&self, input: R::Key) -> SyncResult<()> {
        self.0.delete(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{letter, Letter, LetterFilter};
    use serde_json::json;

    fn service() -> MemoryRecordService<Letter> {
        MemoryRecordService::new()
            .with_records((1..=5).map(letter).collect())
            .with_next_id(6)
    }

    fn params(page: u32, limit: u32, filter: &LetterFilter) -> ListParams {
        ListParams::new(page, limit, filter).unwrap()
    }

    #[test]
    fn list_paginates() {
        let svc = service();
        let page = svc.list(&params(2, 2, &LetterFilter::default())).unwrap();
        let ids: Vec<u64> = page.items.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![3, 4]);
        let totals = page.pagination.unwrap();
        assert_eq!(totals.total, 5);
        assert_eq!(totals.total_pages, 3);
        assert_eq!(svc.list_calls(), 1);
    }

    #[test]
    fn list_filters_by_search_and_field() {
        let svc = service();
        svc.update(json!({"id": 2, "data": {"subject": "Water permit", "status": "sent"}}))
            .unwrap();

        let found = svc
            .list(&params(1, 20, &LetterFilter::matching("PERMIT")))
            .unwrap();
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].id, 2);

        let sent = LetterFilter {
            search: String::new(),
            status: Some("sent".into()),
        };
        assert_eq!(svc.list(&params(1, 20, &sent)).unwrap().items.len(), 1);
    }

    #[test]
    fn create_assigns_id_and_prepends() {
        let svc = service();
        let created = svc
            .create(json!({"subject": "New", "status": "draft"}))
            .unwrap()
            .unwrap();
        assert_eq!(created.id, 6);
        assert_eq!(svc.records()[0].id, 6);
        assert!(svc.create(json!("nope")).is_err());
    }

    #[test]
    fn update_accepts_string_id() {
        let svc = service();
        let updated = svc
            .update(json!({"id": "3", "data": {"status": "archived"}}))
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, 3);
        assert_eq!(updated.status, "archived");

        let missing = svc.update(json!({"id": 99, "data": {}})).unwrap_err();
        assert_eq!(missing.status(), Some(404));
    }

    #[test]
    fn delete_is_idempotent() {
        let svc = service();
        svc.delete(&1).unwrap();
        svc.delete(&1).unwrap();
        assert_eq!(svc.len(), 4);
    }

    #[test]
    fn fail_next_fails_once() {
        let svc = service();
        svc.fail_next("database offline");
        assert!(matches!(
            svc.list(&params(1, 20, &LetterFilter::default())),
            Err(SyncError::Query(_))
        ));
        assert!(svc.list(&params(1, 20, &LetterFilter::default())).is_ok());
    }
}
