//! Storage-side unique index
//!
//! One `IndexTree` per declared uniqueness constraint. The key is a
//! composite of the ruled value (case-folded when the constraint is
//! case-insensitive) followed by the exact scope values. Records whose ruled
//! value is null are never indexed.

use std::collections::HashMap;

use serde_json::Value;

use super::btree::{IndexKey, IndexTree};
use crate::record::{Record, RecordId};
use crate::schema::UniqueConstraint;

#[derive(Debug)]
struct ConstraintTree {
    constraint: UniqueConstraint,
    tree: IndexTree,
}

/// Unique index over every constraint of every record type
#[derive(Debug, Default)]
pub struct UniqueIndex {
    by_type: HashMap<String, Vec<ConstraintTree>>,
}

impl UniqueIndex {
    pub fn new(constraints: impl IntoIterator<Item = UniqueConstraint>) -> Self {
        let mut by_type: HashMap<String, Vec<ConstraintTree>> = HashMap::new();
        for constraint in constraints {
            by_type
                .entry(constraint.record_type.clone())
                .or_default()
                .push(ConstraintTree {
                    constraint,
                    tree: IndexTree::new(),
                });
        }
        Self { by_type }
    }

    /// Builds the index key of `record` under `constraint`.
    ///
    /// Returns None when the ruled value is null.
    pub fn key_for(constraint: &UniqueConstraint, record: &Record) -> Option<IndexKey> {
        let ruled = IndexKey::from_json(record.get(&constraint.field)?);
        let ruled = if constraint.case_sensitive {
            ruled
        } else {
            ruled.fold_case()
        };

        let mut parts = Vec::with_capacity(constraint.scope.len() + 1);
        parts.push(ruled);
        for field in &constraint.scope {
            parts.push(IndexKey::from_json(record.get(field).unwrap_or(&Value::Null)));
        }
        Some(IndexKey::Composite(parts))
    }

    /// Returns the field of the first constraint `record` would violate if
    /// stored under `id`.
    pub fn conflict(&self, record: &Record, id: Option<RecordId>) -> Option<&str> {
        let trees = self.by_type.get(record.record_type())?;
        for entry in trees {
            if let Some(key) = Self::key_for(&entry.constraint, record) {
                if entry
                    .tree
                    .lookup_eq(&key)
                    .iter()
                    .any(|held| Some(*held) != id)
                {
                    return Some(entry.constraint.field.as_str());
                }
            }
        }
        None
    }

    pub fn insert(&mut self, record: &Record, id: RecordId) {
        if let Some(trees) = self.by_type.get_mut(record.record_type()) {
            for entry in trees {
                if let Some(key) = Self::key_for(&entry.constraint, record) {
                    entry.tree.insert(key, id);
                }
            }
        }
    }

    pub fn remove(&mut self, record: &Record, id: RecordId) {
        if let Some(trees) = self.by_type.get_mut(record.record_type()) {
            for entry in trees {
                if let Some(key) = Self::key_for(&entry.constraint, record) {
                    entry.tree.remove(&key, id);
                }
            }
        }
    }

    /// Number of constraints indexed for `record_type`
    pub fn constraint_count(&self, record_type: &str) -> usize {
        self.by_type.get(record_type).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_constraint(case_sensitive: bool) -> UniqueConstraint {
        UniqueConstraint {
            record_type: "group_custom_attribute".into(),
            field: "key".into(),
            scope: vec!["group_id".into()],
            case_sensitive,
        }
    }

    fn attribute(key: &str, group: u64) -> Record {
        Record::new("group_custom_attribute")
            .with("key", key)
            .with("group_id", group)
    }

    #[test]
    fn test_scoped_conflict() {
        let mut index = UniqueIndex::new(vec![key_constraint(true)]);
        index.insert(&attribute("color", 1), RecordId::new(10));

        assert_eq!(index.conflict(&attribute("color", 1), None), Some("key"));
        assert_eq!(index.conflict(&attribute("color", 2), None), None);
        assert_eq!(index.conflict(&attribute("size", 1), None), None);
    }

    #[test]
    fn test_own_id_is_not_a_conflict() {
        let mut index = UniqueIndex::new(vec![key_constraint(true)]);
        index.insert(&attribute("color", 1), RecordId::new(10));

        assert_eq!(index.conflict(&attribute("color", 1), Some(RecordId::new(10))), None);
    }

    #[test]
    fn test_case_insensitive_constraint() {
        let mut index = UniqueIndex::new(vec![key_constraint(false)]);
        index.insert(&attribute("Color", 1), RecordId::new(10));
        assert_eq!(index.conflict(&attribute("cOLOR", 1), None), Some("key"));

        let mut index = UniqueIndex::new(vec![key_constraint(true)]);
        index.insert(&attribute("Color", 1), RecordId::new(10));
        assert_eq!(index.conflict(&attribute("cOLOR", 1), None), None);
    }

    #[test]
    fn test_null_values_never_collide() {
        let mut index = UniqueIndex::new(vec![key_constraint(true)]);
        let unkeyed = Record::new("group_custom_attribute").with("group_id", 1);
        index.insert(&unkeyed, RecordId::new(10));

        assert!(UniqueIndex::key_for(&key_constraint(true), &unkeyed).is_none());
        assert_eq!(index.conflict(&unkeyed, None), None);
    }

    #[test]
    fn test_remove_frees_value() {
        let mut index = UniqueIndex::new(vec![key_constraint(true)]);
        let record = attribute("color", 1);
        index.insert(&record, RecordId::new(10));
        index.remove(&record, RecordId::new(10));

        assert_eq!(index.conflict(&record, None), None);
        assert_eq!(index.constraint_count("group_custom_attribute"), 1);
    }
}
