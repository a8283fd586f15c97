//! In-memory record instance

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::reference::{RecordId, RecordRef};
use crate::schema::ValidationErrors;

/// One row of application data.
///
/// Absent fields and JSON `null` are both "no value" for every reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    record_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<RecordId>,
    fields: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    errors: ValidationErrors,
}

impl Record {
    /// Creates an unsaved, empty record of the given type
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            id: None,
            fields: BTreeMap::new(),
            created_at: None,
            updated_at: None,
            errors: ValidationErrors::new(),
        }
    }

    /// Builder-style field assignment
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    pub fn is_new_record(&self) -> bool {
        self.id.is_none()
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Polymorphic reference, once persisted
    pub fn reference(&self) -> Option<RecordRef> {
        self.id.map(|id| RecordRef::new(self.record_type.clone(), id))
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Raw field value; `null` reads as absent
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    /// Reads a foreign key field
    pub fn get_id(&self, field: &str) -> Option<RecordId> {
        self.get(field).and_then(RecordId::from_json)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Assigns several fields at once
    pub fn assign<K, I>(&mut self, fields: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        for (field, value) in fields {
            self.fields.insert(field.into(), value);
        }
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Errors attached by the last validation pass
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn set_errors(&mut self, errors: ValidationErrors) {
        self.errors = errors;
    }

    pub(crate) fn errors_mut(&mut self) -> &mut ValidationErrors {
        &mut self.errors
    }

    /// Records the identity and timestamps assigned by a store on commit.
    pub fn assign_identity(
        &mut self,
        id: RecordId,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) {
        self.id = Some(id);
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_record_is_unsaved() {
        let record = Record::new("label");
        assert!(record.is_new_record());
        assert!(!record.is_persisted());
        assert!(record.reference().is_none());
    }

    #[test]
    fn test_null_reads_as_absent() {
        let record = Record::new("label").with("title", Value::Null);
        assert!(record.contains("title"));
        assert!(record.get("title").is_none());
        assert!(record.get_str("title").is_none());
    }

    #[test]
    fn test_typed_readers() {
        let record = Record::new("project")
            .with("name", "gitlab")
            .with("visibility_level", 20)
            .with("repository_size", 1.5)
            .with("archived", false)
            .with("group_id", 3);

        assert_eq!(record.get_str("name"), Some("gitlab"));
        assert_eq!(record.get_i64("visibility_level"), Some(20));
        assert_eq!(record.get_f64("repository_size"), Some(1.5));
        assert_eq!(record.get_bool("archived"), Some(false));
        assert_eq!(record.get_id("group_id"), Some(RecordId::new(3)));
    }

    #[test]
    fn test_assign_identity() {
        let mut record = Record::new("label");
        let now = Utc::now();
        record.assign_identity(RecordId::new(9), now, now);

        assert!(record.is_persisted());
        assert_eq!(record.reference().unwrap().to_string(), "label#9");
        assert_eq!(record.created_at(), Some(now));
    }

    #[test]
    fn test_serialization_skips_errors() {
        let record = Record::new("label").with("title", "bug");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["record_type"], "label");
        assert_eq!(json["fields"], json!({"title": "bug"}));
        assert!(json.get("errors").is_none());
    }
}
