//! # RecordSync Cache
//!
//! Generic, observable client-side cache for one record type.
//!
//! This crate provides:
//! - `Record` and `Filter` traits describing what can be cached
//! - `FieldPatch` for shallow, field-level merges
//! - `Pagination` descriptor and `PaginationPatch`
//! - `EntityCache`, the keyed collection + selection + filter + pagination
//!   state container
//!
//! ## Key Invariants
//!
//! - Changing the filter always resets the page to 1
//! - Server totals are written together, never half-updated
//! - Cache operations never fail; unmatched identifiers are silent no-ops
//!
//! The cache has no networking dependency. Keeping it in agreement with a
//! server is the job of `recordsync_engine`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod pagination;
mod patch;
mod record;

pub use cache::{CacheState, EntityCache};
pub use config::CacheConfig;
pub use pagination::{Pagination, PaginationPatch};
pub use patch::FieldPatch;
pub use record::{Filter, Record};
