//! Record identity and polymorphic references

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage-assigned identity. Never reused within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// Reads a foreign key value. Only positive integers are identities.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value.as_u64() {
            Some(0) | None => None,
            Some(v) => Some(Self(v)),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<RecordId> for Value {
    fn from(id: RecordId) -> Self {
        Value::from(id.0)
    }
}

/// A (type tag, identity) pair: the only way to point at a persisted record
/// without knowing its type statically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordRef {
    pub record_type: String,
    pub id: RecordId,
}

impl RecordRef {
    pub fn new(record_type: impl Into<String>, id: RecordId) -> Self {
        Self {
            record_type: record_type.into(),
            id,
        }
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.record_type, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_foreign_key_parsing() {
        assert_eq!(RecordId::from_json(&json!(7)), Some(RecordId::new(7)));
        assert_eq!(RecordId::from_json(&json!(0)), None);
        assert_eq!(RecordId::from_json(&json!(-3)), None);
        assert_eq!(RecordId::from_json(&json!("7")), None);
        assert_eq!(RecordId::from_json(&Value::Null), None);
    }

    #[test]
    fn test_reference_display() {
        let r = RecordRef::new("label", RecordId::new(12));
        assert_eq!(r.to_string(), "label#12");
    }
}
