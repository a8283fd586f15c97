//! BTreeMap-based index structures
//!
//! Indexes use BTreeMap<IndexKey, Vec<RecordId>> for deterministic ordering.
//! Ids are always sorted ascending.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::record::RecordId;

/// Index key representing a field value.
///
/// Ordering is deterministic: Null < Bool < Int < Float < String < Composite.
/// Integral floats are keyed as ints, so `1` and `1.0` collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    /// Absent or null value
    Null,
    /// Boolean value (false < true)
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value (stored as bits for total ordering)
    Float(u64),
    /// String value
    String(String),
    /// Several keys compared element-wise (scoped uniqueness, arrays)
    Composite(Vec<IndexKey>),
}

impl IndexKey {
    /// Create a key from a float
    ///
    /// Uses bit representation for total ordering.
    pub fn from_float(v: f64) -> Self {
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
            return IndexKey::Int(v as i64);
        }
        let bits = v.to_bits();
        // Negative: flip all bits. Positive: flip sign bit.
        let ordered = if (bits >> 63) == 1 {
            !bits
        } else {
            bits ^ (1 << 63)
        };
        IndexKey::Float(ordered)
    }

    pub fn from_string(v: impl Into<String>) -> Self {
        IndexKey::String(v.into())
    }

    /// Create a key from a JSON value. Objects are keyed by their
    /// serialized form.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => IndexKey::Null,
            Value::Bool(b) => IndexKey::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => IndexKey::Int(i),
                None => IndexKey::from_float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => IndexKey::from_string(s.as_str()),
            Value::Array(items) => IndexKey::Composite(items.iter().map(IndexKey::from_json).collect()),
            Value::Object(_) => IndexKey::String(value.to_string()),
        }
    }

    /// Lowercases every string component
    pub fn fold_case(self) -> Self {
        match self {
            IndexKey::String(s) => IndexKey::String(s.to_lowercase()),
            IndexKey::Composite(keys) => {
                IndexKey::Composite(keys.into_iter().map(IndexKey::fold_case).collect())
            }
            other => other,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, IndexKey::Null)
    }
}

/// A single index using BTreeMap for deterministic ordering.
#[derive(Debug, Default)]
pub struct IndexTree {
    /// Maps key values to sorted lists of ids
    tree: BTreeMap<IndexKey, Vec<RecordId>>,
}

impl IndexTree {
    pub fn new() -> Self {
        Self {
            tree: BTreeMap::new(),
        }
    }

    /// Insert an id for a key.
    ///
    /// Maintains sorted ascending order.
    pub fn insert(&mut self, key: IndexKey, id: RecordId) {
        let ids = self.tree.entry(key).or_default();
        if let Err(pos) = ids.binary_search(&id) {
            ids.insert(pos, id);
        }
    }

    /// Remove an id for a key.
    ///
    /// If the key has no more ids, removes the key entirely.
    pub fn remove(&mut self, key: &IndexKey, id: RecordId) {
        if let Some(ids) = self.tree.get_mut(key) {
            if let Ok(pos) = ids.binary_search(&id) {
                ids.remove(pos);
            }
            if ids.is_empty() {
                self.tree.remove(key);
            }
        }
    }

    /// Lookup all ids for an exact key match, sorted ascending.
    pub fn lookup_eq(&self, key: &IndexKey) -> &[RecordId] {
        self.tree.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}
