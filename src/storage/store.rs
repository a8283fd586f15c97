//! Persistence boundary
//!
//! The validation and association layers only ever talk to storage through
//! `RecordStore`. Implementations must make `commit` and `commit_destroy`
//! atomic and must enforce uniqueness constraints themselves.

use serde_json::Value;

use super::errors::StorageResult;
use crate::index::IndexKey;
use crate::record::{Record, RecordId, RecordRef};

/// One equality test of a scope predicate
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub field: String,
    /// `null` matches absent and null fields
    pub value: Value,
    pub case_sensitive: bool,
}

impl Clause {
    fn key(&self, value: &Value) -> IndexKey {
        let key = IndexKey::from_json(value);
        if self.case_sensitive {
            key
        } else {
            key.fold_case()
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        let held = record.get(&self.field).unwrap_or(&Value::Null);
        self.key(held) == self.key(&self.value)
    }
}

/// Conjunction of field equalities, optionally excluding one record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopePredicate {
    clauses: Vec<Clause>,
    exclude_id: Option<RecordId>,
}

impl ScopePredicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause {
            field: field.into(),
            value: value.into(),
            case_sensitive: true,
        });
        self
    }

    pub fn eq_ignore_case(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause {
            field: field.into(),
            value: value.into(),
            case_sensitive: false,
        });
        self
    }

    /// Excludes the record with this id, if any
    pub fn excluding(mut self, id: Option<RecordId>) -> Self {
        self.exclude_id = id;
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn matches(&self, record: &Record) -> bool {
        if self.exclude_id.is_some() && record.id() == self.exclude_id {
            return false;
        }
        self.clauses.iter().all(|c| c.matches(record))
    }
}

/// The persistence boundary consumed by validation and association code.
pub trait RecordStore: Send + Sync {
    /// Looks up one record. Unknown types have no records.
    fn find(&self, record_type: &str, id: RecordId) -> StorageResult<Option<Record>>;

    /// All records of `record_type` matching `predicate`, ordered by id
    fn find_matching(&self, record_type: &str, predicate: &ScopePredicate)
        -> StorageResult<Vec<Record>>;

    fn count(&self, record_type: &str) -> StorageResult<usize>;

    /// Inserts (no id) or updates (id) a record atomically.
    ///
    /// Returns the stored record with its identity and timestamps.
    /// Fails with `UniqueViolation` if a uniqueness constraint would break,
    /// and with `MissingParent` if a required or cascading parent is gone.
    fn commit(&self, record: &Record) -> StorageResult<Record>;

    /// Removes every listed record, or none of them.
    ///
    /// Fails with `LiveDependent` if an unlisted record still cascades from
    /// a listed one. Returns the number of records removed.
    fn commit_destroy(&self, refs: &[RecordRef]) -> StorageResult<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_predicate_matching() {
        let mut record = Record::new("feature_flag").with("name", "Dark-Mode").with("project_id", 1);
        let now = chrono::Utc::now();
        record.assign_identity(RecordId::new(5), now, now);

        assert!(ScopePredicate::new()
            .eq("name", "Dark-Mode")
            .eq("project_id", 1)
            .matches(&record));
        assert!(!ScopePredicate::new().eq("name", "dark-mode").matches(&record));
        assert!(ScopePredicate::new()
            .eq_ignore_case("name", "dark-mode")
            .matches(&record));
        assert!(!ScopePredicate::new()
            .eq("name", "Dark-Mode")
            .excluding(Some(RecordId::new(5)))
            .matches(&record));
    }

    #[test]
    fn test_null_clause_matches_absent_field() {
        let record = Record::new("label").with("title", "bug");
        assert!(ScopePredicate::new().eq("group_id", json!(null)).matches(&record));
        assert!(!ScopePredicate::new().eq("group_id", 1).matches(&record));
    }
}
