//! Mutation payloads.

use serde::{Deserialize, Serialize};

/// Default body of an update mutation: `{id, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePayload<I, D> {
    /// Identifier of the record to update.
    pub id: I,
    /// Fields to update.
    pub data: D,
}

impl<I, D> UpdatePayload<I, D> {
    /// Creates an update payload.
    pub fn new(id: I, data: D) -> Self {
        Self { id, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape() {
        let payload = UpdatePayload::new(4u64, json!({"subject": "Re: invoice"}));
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"id": 4, "data": {"subject": "Re: invoice"}})
        );
    }
}
