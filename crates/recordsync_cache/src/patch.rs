//! Shallow field-level patches.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A set of top-level fields to overwrite on a record or filter.
///
/// Merging is shallow: each listed field replaces the target's field of the
/// same name, every other field is left as it was.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPatch(Map<String, Value>);

impl FieldPatch {
    /// Creates an empty patch.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Adds a field to the patch.
    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Builds a patch listing every field of `value`.
    ///
    /// Returns `None` if `value` does not serialize to an object.
    pub fn from_value<T: Serialize>(value: &T) -> Option<Self> {
        match serde_json::to_value(value) {
            Ok(Value::Object(map)) => Some(Self(map)),
            _ => None,
        }
    }

    /// Returns the value for `field`, if listed.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Iterates over the listed field names.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns the number of listed fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no fields are listed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a copy of `target` with the listed fields overwritten.
    ///
    /// Fails if `target` is not an object or if the merged object no longer
    /// deserializes as `T`.
    pub fn merged<T>(&self, target: &T) -> Result<T, serde_json::Error>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut base = match serde_json::to_value(target)? {
            Value::Object(map) => map,
            _ => {
                return Err(<serde_json::Error as serde::de::Error>::custom(
                    "patch target is not an object",
                ))
            }
        };
        for (field, value) in &self.0 {
            base.insert(field.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(base))
    }

    /// Consumes the patch and returns the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for FieldPatch {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Letter {
        id: u64,
        subject: String,
        pages: u32,
    }

    fn letter() -> Letter {
        Letter {
            id: 7,
            subject: "Permit renewal".into(),
            pages: 3,
        }
    }

    #[test]
    fn merge_overwrites_listed_fields_only() {
        let patch = FieldPatch::new().set("subject", "Permit denial");
        let merged = patch.merged(&letter()).unwrap();

        assert_eq!(merged.subject, "Permit denial");
        assert_eq!(merged.id, 7);
        assert_eq!(merged.pages, 3);
    }

    #[test]
    fn merge_with_wrong_type_fails() {
        let patch = FieldPatch::new().set("pages", "many");
        assert!(patch.merged(&letter()).is_err());
    }

    #[test]
    fn merge_into_non_object_fails() {
        let patch = FieldPatch::new().set("x", 1);
        assert!(patch.merged(&42u32).is_err());
    }

    #[test]
    fn from_value_lists_every_field() {
        let patch = FieldPatch::from_value(&letter()).unwrap();
        let mut fields: Vec<_> = patch.fields().collect();
        fields.sort_unstable();
        assert_eq!(fields, vec!["id", "pages", "subject"]);

        assert!(FieldPatch::from_value(&"plain").is_none());
    }

    #[test]
    fn unknown_fields_are_ignored_by_target() {
        let patch = FieldPatch::new().set("attachment", true);
        assert_eq!(patch.merged(&letter()).unwrap(), letter());
    }
}
