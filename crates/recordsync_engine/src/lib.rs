//! # RecordSync Engine
//!
//! Keeps entity caches in agreement with a server.
//!
//! This crate provides:
//! - `SyncOrchestrator`, binding one cache to a list query and three mutations
//! - `DetailSync`, binding a detail query to a cache's selection
//! - `SecureClient`, sending replay-protected requests with a rotating token
//! - Query, mutation and HTTP transport abstractions
//! - An in-memory record service for demos and tests
//!
//! ## Architecture
//!
//! The cache's filter and page select the list query's parameters; the
//! query's results are written back into the same cache:
//! 1. Read `{page, limit, ...filters}` from the cache
//! 2. Fetch one page from the list query
//! 3. Replace the cached items and write back the server totals
//!
//! Mutations are applied to the cache only after they resolve.
//!
//! ## Key Invariants
//!
//! - Results never write `page` or `limit`, so reconciliation cannot loop
//! - A failed query or mutation leaves the cache unchanged
//! - Errors propagate unchanged; the only automatic recovery is one
//!   stale-token retry in `SecureClient`

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod detail;
mod error;
mod memory;
mod mutation;
mod orchestrator;
mod query;
mod secure;
mod transport;

#[cfg(test)]
mod testing;

pub use config::{SecureClientConfig, SyncOptions, ENV_API_ROOT, ENV_BASE_URL, ENV_SKIP_CSRF};
pub use detail::{DetailState, DetailSync};
pub use error::{SyncError, SyncResult, STALE_TOKEN_STATUS};
pub use memory::{CreateRecord, DeleteRecord, MemoryRecordService, UpdateRecord};
pub use mutation::{mutation_fn, FnMutation, Mutation, MutationHandle, MutationSet};
pub use orchestrator::SyncOrchestrator;
pub use query::{DetailQuery, ListQuery, QueryState};
pub use secure::{SecureClient, SecureClientStats};
pub use transport::{HttpClient, LoopbackClient, LoopbackServer};
