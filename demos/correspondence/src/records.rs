//! Record types of the correspondence register and their seed data.

use recordsync_cache::{CacheConfig, EntityCache, Filter, Record};
use recordsync_engine::{MemoryRecordService, SyncOptions, SyncOrchestrator};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::Display;
use std::sync::Arc;

/// An incoming or outgoing letter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub agency_id: Option<u64>,
    #[serde(default)]
    pub status: String,
}

/// A government agency that sends or receives correspondence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agency {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
}

/// A supplier referenced by tender correspondence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
}

/// A project that groups documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: String,
}

/// A registry clerk. User endpoints address users by a string id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub role: String,
}

macro_rules! numeric_record {
    ($($ty:ty),*) => {
        $(impl Record for $ty {
            type Key = u64;

            fn key(&self) -> u64 {
                self.id
            }
        })*
    };
}

numeric_record!(Document, Agency, Vendor, Project, User);

/// Filter for document lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentFilter {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: String,
}

impl Filter for DocumentFilter {
    fn search(&self) -> &str {
        &self.search
    }
}

/// Search-only filter shared by the reference record types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilter {
    #[serde(default)]
    pub search: String,
}

impl Filter for SearchFilter {
    fn search(&self) -> &str {
        &self.search
    }
}

/// The record types the register manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RecordKind {
    Documents,
    Agencies,
    Vendors,
    Projects,
    Users,
}

fn seed<R: DeserializeOwned>(rows: Vec<Value>) -> serde_json::Result<Vec<R>> {
    rows.into_iter().map(serde_json::from_value).collect()
}

/// Seed documents.
pub fn documents() -> serde_json::Result<Vec<Document>> {
    let subjects = [
        "Request for budget ceiling",
        "Water permit renewal",
        "Tender award notification",
        "Audit query response",
        "Road maintenance schedule",
        "Staff transfer approval",
        "Procurement plan submission",
        "Land survey report",
        "Tender clarification",
        "Quarterly progress report",
        "Permit fee review",
        "Invitation to stakeholder meeting",
    ];
    let statuses = ["draft", "sent", "received", "archived"];
    seed(
        subjects
            .iter()
            .enumerate()
            .map(|(i, subject)| {
                json!({
                    "id": i + 1,
                    "reference": format!("MOF/{:04}", i + 1),
                    "subject": subject,
                    "agency_id": (i % 3) + 1,
                    "status": statuses[i % statuses.len()],
                })
            })
            .collect(),
    )
}

/// Seed agencies.
pub fn agencies() -> serde_json::Result<Vec<Agency>> {
    seed(vec![
        json!({"id": 1, "name": "Ministry of Finance", "code": "MOF"}),
        json!({"id": 2, "name": "Ministry of Works", "code": "MOW"}),
        json!({"id": 3, "name": "Public Procurement Authority", "code": "PPA"}),
    ])
}

/// Seed vendors.
pub fn vendors() -> serde_json::Result<Vec<Vendor>> {
    seed(vec![
        json!({"id": 1, "name": "Kilimo Supplies", "category": "goods"}),
        json!({"id": 2, "name": "Mto Engineering", "category": "works"}),
        json!({"id": 3, "name": "Pwani Consulting", "category": "services"}),
    ])
}

/// Seed projects.
pub fn projects() -> serde_json::Result<Vec<Project>> {
    seed(vec![
        json!({"id": 1, "title": "Rural roads phase II", "status": "active"}),
        json!({"id": 2, "title": "Records digitisation", "status": "planning"}),
    ])
}

/// Seed users.
pub fn users() -> serde_json::Result<Vec<User>> {
    seed(vec![
        json!({"id": 1, "username": "registry", "role": "clerk"}),
        json!({"id": 2, "username": "director", "role": "approver"}),
    ])
}

/// Creates a seeded service.
pub fn service<R: Record>(records: Vec<R>) -> Arc<MemoryRecordService<R>> {
    let next = records.len() as u64 + 1;
    Arc::new(
        MemoryRecordService::new()
            .with_records(records)
            .with_next_id(next),
    )
}

/// Wires an orchestrator with default options.
pub fn orchestrator<R, F>(
    service: &Arc<MemoryRecordService<R>>,
    page_size: u32,
) -> SyncOrchestrator<R, F>
where
    R: Record<Key = u64>,
    F: Filter + Default,
{
    SyncOrchestrator::new(
        Arc::new(EntityCache::new(
            CacheConfig::new(F::default()).with_page_size(page_size),
        )),
        Arc::clone(service),
        service.mutations(),
        SyncOptions::default(),
    )
}

/// Wires the user orchestrator. Callers pass string ids which are parsed
/// before they reach the cache.
pub fn user_orchestrator(
    service: &Arc<MemoryRecordService<User>>,
    page_size: u32,
) -> SyncOrchestrator<User, SearchFilter, String> {
    use recordsync_engine::{mutation_fn, CreateRecord, MutationSet, SyncError, UpdateRecord};

    let deleter = Arc::clone(service);
    SyncOrchestrator::new(
        Arc::new(EntityCache::new(
            CacheConfig::new(SearchFilter::default()).with_page_size(page_size),
        )),
        Arc::clone(service),
        MutationSet::new(
            CreateRecord(Arc::clone(service)),
            UpdateRecord(Arc::clone(service)),
            mutation_fn(move |id: String| {
                let deleter = Arc::clone(&deleter);
                async move {
                    let key = parse_id(&id).ok_or_else(|| SyncError::Mutation(format!("bad user id {id}")))?;
                    deleter.delete(&key)
                }
            }),
        ),
        SyncOptions::<User, String>::with_store_id_transform(|id: &String| {
            parse_id(id).unwrap_or_default()
        }),
    )
}

fn parse_id(id: &str) -> Option<u64> {
    id.trim().parse().ok()
}

/// Prints a page of records, one JSON object per line.
pub fn print_page<R: Record, F: Filter, W: Send + Sync + 'static>(
    label: impl Display,
    orchestrator: &SyncOrchestrator<R, F, W>,
) {
    let p = orchestrator.pagination();
    println!(
        "{label}: page {}/{} ({} total, {} per page)",
        p.page, p.total_pages, p.total, p.limit
    );
    for item in orchestrator.items() {
        match serde_json::to_string(&item) {
            Ok(line) => println!("  {line}"),
            Err(e) => tracing::warn!(error = %e, "record not printable"),
        }
    }
}
