//! List query messages.

use crate::error::{ProtocolError, ProtocolResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Totals reported by the server alongside a page of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerPagination {
    /// Total number of matching records.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u32,
}

impl ServerPagination {
    /// Creates server totals.
    pub fn new(total: u64, total_pages: u32) -> Self {
        Self { total, total_pages }
    }
}

/// Result of a list query.
///
/// `pagination` is optional; its absence is a valid response that carries
/// no totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEnvelope<R> {
    /// Records on the requested page.
    pub items: Vec<R>,
    /// Server-reported totals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<ServerPagination>,
}

impl<R> ListEnvelope<R> {
    /// Creates an envelope without totals.
    pub fn new(items: Vec<R>) -> Self {
        Self {
            items,
            pagination: None,
        }
    }

    /// Attaches server totals.
    pub fn with_pagination(mut self, total: u64, total_pages: u32) -> Self {
        self.pagination = Some(ServerPagination::new(total, total_pages));
        self
    }
}

impl<R: Serialize + DeserializeOwned> ListEnvelope<R> {
    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Value> {
        serde_json::to_value(self).map_err(ProtocolError::Encode)
    }

    /// Decodes from JSON.
    pub fn decode(value: Value) -> ProtocolResult<Self> {
        serde_json::from_value(value).map_err(ProtocolError::Decode)
    }
}

/// Input parameters of a list query: `{page, limit, ...filters}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    /// Requested page, 1-based.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Flattened filter fields. Unset (`null`) fields are omitted.
    pub filters: Map<String, Value>,
}

impl ListParams {
    /// Builds parameters from a page position and a serializable filter.
    ///
    /// Fails if the filter does not serialize to an object.
    pub fn new<F: Serialize>(page: u32, limit: u32, filters: &F) -> ProtocolResult<Self> {
        let mut filters = match serde_json::to_value(filters).map_err(ProtocolError::Encode)? {
            Value::Object(map) => map,
            _ => return Err(ProtocolError::invalid_structure("filter must be an object")),
        };
        filters.retain(|_, v| !v.is_null());
        Ok(Self {
            page,
            limit,
            filters,
        })
    }

    /// Returns a filter field.
    pub fn filter(&self, name: &str) -> Option<&Value> {
        self.filters.get(name)
    }

    /// Returns the free-text search term, if set and non-empty.
    pub fn search(&self) -> Option<&str> {
        self.filter("search")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Flattens into a single JSON object. `page` and `limit` take
    /// precedence over filter fields of the same name.
    pub fn to_value(&self) -> Value {
        let mut map = self.filters.clone();
        map.insert("page".into(), Value::from(self.page));
        map.insert("limit".into(), Value::from(self.limit));
        Value::Object(map)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn flattened_params_carry_position(page in 1u32..1000, limit in 1u32..200, search in "[a-z ]{0,16}") {
            let params = ListParams::new(page, limit, &serde_json::json!({"search": search})).unwrap();
            let value = params.to_value();
            prop_assert_eq!(value["page"].as_u64(), Some(u64::from(page)));
            prop_assert_eq!(value["limit"].as_u64(), Some(u64::from(limit)));
            prop_assert_eq!(value["search"].as_str(), Some(search.as_str()));
        }
    }
}
