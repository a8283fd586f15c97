//! Association resolution and cascade planning
//!
//! - `belongs_to` reads the key (and type tag, if polymorphic) on the record
//! - `has_one` / `has_many` look the key up on the target type
//! - Unsaved owners have no children
//!
//! Resolution only reads the store; `cascade_set` plans a destroy but never
//! performs it.

use std::collections::HashSet;

use serde_json::Value;

use super::errors::{AssociationError, AssociationResult};
use crate::record::{Record, RecordRef};
use crate::schema::{Association, AssociationKind, AssociationTarget, SchemaRegistry};
use crate::storage::{RecordStore, ScopePredicate};

/// Result of resolving one association
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// `belongs_to` or `has_one`; None is an explicit "no value"
    One(Option<Record>),
    /// `has_many`, ordered by id
    Many(Vec<Record>),
}

impl Resolved {
    /// Every resolved record, regardless of cardinality
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Resolved::One(record) => record.into_iter().collect(),
            Resolved::Many(records) => records,
        }
    }
}

/// Resolves declared associations through the store
pub struct AssociationResolver<'a> {
    registry: &'a SchemaRegistry,
    store: &'a dyn RecordStore,
}

impl<'a> AssociationResolver<'a> {
    pub fn new(registry: &'a SchemaRegistry, store: &'a dyn RecordStore) -> Self {
        Self { registry, store }
    }

    /// Resolves association `name` of `record`
    pub fn resolve(&self, record: &Record, name: &str) -> AssociationResult<Resolved> {
        let descriptor = self.registry.require(record.record_type())?;
        let assoc = descriptor.association_def(name).ok_or_else(|| {
            AssociationError::UnknownAssociation {
                record_type: record.record_type().to_string(),
                name: name.to_string(),
            }
        })?;
        self.resolve_declared(record, assoc)
    }

    /// Resolves a `belongs_to` or `has_one`
    pub fn resolve_one(&self, record: &Record, name: &str) -> AssociationResult<Option<Record>> {
        match self.resolve(record, name)? {
            Resolved::One(target) => Ok(target),
            Resolved::Many(_) => Err(AssociationError::Cardinality {
                name: name.to_string(),
                expected: "singular",
            }),
        }
    }

    /// Resolves a `has_many`
    pub fn resolve_many(&self, record: &Record, name: &str) -> AssociationResult<Vec<Record>> {
        match self.resolve(record, name)? {
            Resolved::Many(targets) => Ok(targets),
            Resolved::One(_) => Err(AssociationError::Cardinality {
                name: name.to_string(),
                expected: "a collection",
            }),
        }
    }

    fn resolve_declared(&self, record: &Record, assoc: &Association) -> AssociationResult<Resolved> {
        match assoc.kind {
            AssociationKind::BelongsTo => self.resolve_owner(record, assoc).map(Resolved::One),
            AssociationKind::HasOne => {
                let mut children = self.children(record, assoc)?;
                if children.len() > 1 {
                    return Err(AssociationError::Ambiguous {
                        owner: owner_label(record),
                        name: assoc.name.clone(),
                        count: children.len(),
                    });
                }
                Ok(Resolved::One(children.pop()))
            }
            AssociationKind::HasMany => self.children(record, assoc).map(Resolved::Many),
        }
    }

    fn resolve_owner(&self, record: &Record, assoc: &Association) -> AssociationResult<Option<Record>> {
        let id = match record.get_id(&assoc.foreign_key) {
            Some(id) => id,
            None => return Ok(None),
        };

        let target = match &assoc.target {
            AssociationTarget::Type(name) => name.as_str(),
            AssociationTarget::Polymorphic => {
                match assoc.type_field().and_then(|f| record.get_str(&f).map(str::to_string)) {
                    Some(tag) if self.registry.contains(&tag) => {
                        return Ok(self.store.find(&tag, id)?);
                    }
                    _ => return Ok(None),
                }
            }
        };

        Ok(self.store.find(target, id)?)
    }

    fn children(&self, record: &Record, assoc: &Association) -> AssociationResult<Vec<Record>> {
        let (owner_id, target) = match (record.id(), assoc.target_type()) {
            (Some(id), Some(target)) => (id, target),
            _ => return Ok(Vec::new()),
        };

        let mut predicate = ScopePredicate::new().eq(assoc.foreign_key.clone(), Value::from(owner_id));
        if let Some(type_field) = assoc.type_field() {
            predicate = predicate.eq(type_field, record.record_type());
        }

        Ok(self.store.find_matching(target, &predicate)?)
    }

    /// Every record destroyed along with `record`, children before parents,
    /// ending with `record` itself.
    ///
    /// Follows `dependent: Destroy` associations transitively. Each record
    /// appears once, even when reachable twice or through a cycle. An
    /// unsaved record has an empty cascade set.
    pub fn cascade_set(&self, record: &Record) -> AssociationResult<Vec<RecordRef>> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        self.visit(record, &mut visited, &mut order)?;
        Ok(order)
    }

    fn visit(
        &self,
        record: &Record,
        visited: &mut HashSet<RecordRef>,
        order: &mut Vec<RecordRef>,
    ) -> AssociationResult<()> {
        let reference = match record.reference() {
            Some(reference) => reference,
            None => return Ok(()),
        };
        if !visited.insert(reference.clone()) {
            return Ok(());
        }

        let descriptor = self.registry.require(record.record_type())?;
        for assoc in descriptor.cascading_associations() {
            for child in self.resolve_declared(record, assoc)?.into_records() {
                self.visit(&child, visited, order)?;
            }
        }

        order.push(reference);
        Ok(())
    }
}

fn owner_label(record: &Record) -> String {
    record
        .reference()
        .map(|r| r.to_string())
        .unwrap_or_else(|| format!("unsaved {}", record.record_type()))
}
