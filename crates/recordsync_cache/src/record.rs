//! Traits for cacheable records and their filters.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;

/// A record that can live in an [`EntityCache`](crate::EntityCache).
///
/// The only structural requirement is a unique key. Records must be
/// serializable because field-level patches are merged through their
/// serialized form.
pub trait Record: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Key type used to match records inside the cache.
    type Key: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// Returns the record's key.
    fn key(&self) -> Self::Key;
}

/// Filter applied to a record type's list query.
///
/// The shape is record-type specific; every filter carries at least a
/// free-text search field.
pub trait Filter: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Returns the free-text search term.
    fn search(&self) -> &str;
}
