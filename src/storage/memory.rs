//! In-memory reference store
//!
//! All tables, the id sequence and the unique index live behind a single
//! `RwLock`, so every commit re-checks uniqueness under the same write lock
//! that applies it. Two writers racing for one value are serialized here;
//! exactly one wins.
//!
//! Foreign keys are checked under the same lock. A commit fails if a
//! required or cascading parent is gone, and a destroy fails if a live
//! record outside the destroy set still cascades from a record inside it.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use super::errors::{StorageError, StorageResult};
use super::store::{RecordStore, ScopePredicate};
use crate::fault::{points, FaultInjector};
use crate::index::UniqueIndex;
use crate::record::{Record, RecordId, RecordRef};
use crate::schema::{ForeignKeyLink, SchemaRegistry, ValidationErrors};

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, BTreeMap<RecordId, Record>>,
    last_id: u64,
    unique: UniqueIndex,
}

/// Thread-safe in-memory `RecordStore`
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    links: Vec<ForeignKeyLink>,
    faults: FaultInjector,
}

impl MemoryStore {
    /// Creates a store with one table per registered type, enforcing every
    /// declared uniqueness constraint and foreign key link.
    pub fn for_registry(registry: &SchemaRegistry) -> Self {
        let tables = registry
            .record_types()
            .map(|t| (t.name.clone(), BTreeMap::new()))
            .collect();

        Self {
            state: RwLock::new(State {
                tables,
                last_id: 0,
                unique: UniqueIndex::new(registry.unique_constraints()),
            }),
            links: registry.foreign_key_links(),
            faults: FaultInjector::new(),
        }
    }

    /// Fault points of this store
    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    /// Total number of records across all tables
    pub fn total(&self) -> StorageResult<usize> {
        Ok(self.read()?.tables.values().map(BTreeMap::len).sum())
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| StorageError::Poisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| StorageError::Poisoned)
    }

    /// First required or cascading parent of `record` that does not exist
    fn missing_parent(&self, state: &State, record: &Record) -> Option<StorageError> {
        self.links
            .iter()
            .filter(|link| link.required || link.cascades)
            .find_map(|link| {
                let parent = link.parent_of(record)?;
                if state.contains(&parent) {
                    None
                } else {
                    Some(StorageError::MissingParent {
                        association: link.association.clone(),
                        parent,
                    })
                }
            })
    }

    /// First live record outside `doomed` that cascades from a record in it
    fn live_dependent(&self, state: &State, doomed: &HashSet<&RecordRef>) -> Option<StorageError> {
        self.links.iter().filter(|link| link.cascades).find_map(|link| {
            let table = state.tables.get(&link.record_type)?;
            table.values().find_map(|record| {
                let parent = link.parent_of(record)?;
                let dependent = record.reference()?;
                if doomed.contains(&parent) && !doomed.contains(&dependent) {
                    Some(StorageError::LiveDependent { dependent, parent })
                } else {
                    None
                }
            })
        })
    }
}

impl State {
    fn contains(&self, reference: &RecordRef) -> bool {
        self.tables
            .get(&reference.record_type)
            .map_or(false, |table| table.contains_key(&reference.id))
    }
}

impl RecordStore for MemoryStore {
    fn find(&self, record_type: &str, id: RecordId) -> StorageResult<Option<Record>> {
        let state = self.read()?;
        Ok(state
            .tables
            .get(record_type)
            .and_then(|table| table.get(&id))
            .cloned())
    }

    fn find_matching(
        &self,
        record_type: &str,
        predicate: &ScopePredicate,
    ) -> StorageResult<Vec<Record>> {
        let state = self.read()?;
        Ok(state
            .tables
            .get(record_type)
            .map(|table| {
                table
                    .values()
                    .filter(|r| predicate.matches(r))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn count(&self, record_type: &str) -> StorageResult<usize> {
        Ok(self.read()?.tables.get(record_type).map_or(0, BTreeMap::len))
    }

    fn commit(&self, record: &Record) -> StorageResult<Record> {
        let mut guard = self.write()?;
        let state = &mut *guard;

        if self.faults.triggered(points::COMMIT_BEFORE_WRITE) {
            return Err(StorageError::FaultInjected(points::COMMIT_BEFORE_WRITE.into()));
        }

        if let Some(err) = self.missing_parent(state, record) {
            return Err(err);
        }

        let table = state
            .tables
            .get_mut(record.record_type())
            .ok_or_else(|| StorageError::UnknownTable(record.record_type().to_string()))?;

        let previous = match record.id() {
            Some(id) => {
                let old = table
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| StorageError::NotFound(RecordRef::new(record.record_type(), id)))?;
                Some((id, old))
            }
            None => None,
        };

        if let Some(field) = state.unique.conflict(record, record.id()) {
            return Err(StorageError::UniqueViolation {
                record_type: record.record_type().to_string(),
                field: field.to_string(),
            });
        }

        let now = Utc::now();
        let mut stored = record.clone();
        stored.set_errors(ValidationErrors::new());

        let id = match previous {
            Some((id, old)) => {
                stored.assign_identity(id, old.created_at().unwrap_or(now), now);
                state.unique.remove(&old, id);
                id
            }
            None => {
                state.last_id += 1;
                let id = RecordId::new(state.last_id);
                stored.assign_identity(id, now, now);
                id
            }
        };

        state.unique.insert(&stored, id);
        table.insert(id, stored.clone());
        Ok(stored)
    }

    fn commit_destroy(&self, refs: &[RecordRef]) -> StorageResult<usize> {
        let mut guard = self.write()?;
        let state = &mut *guard;

        let mut seen = HashSet::new();
        let mut targets = Vec::with_capacity(refs.len());
        for reference in refs {
            if !seen.insert(reference) {
                continue;
            }
            if !state.contains(reference) {
                return Err(StorageError::NotFound(reference.clone()));
            }
            targets.push(reference);
        }

        if let Some(err) = self.live_dependent(state, &seen) {
            return Err(err);
        }

        let mut removed: Vec<Record> = Vec::with_capacity(targets.len());
        for reference in targets {
            if !removed.is_empty() && self.faults.triggered(points::DESTROY_AFTER_FIRST_REMOVE) {
                restore(state, removed);
                return Err(StorageError::FaultInjected(
                    points::DESTROY_AFTER_FIRST_REMOVE.into(),
                ));
            }

            let record = state
                .tables
                .get_mut(&reference.record_type)
                .and_then(|table| table.remove(&reference.id));
            if let Some(record) = record {
                state.unique.remove(&record, reference.id);
                removed.push(record);
            }
        }

        Ok(removed.len())
    }
}

/// Puts back records removed by an aborted destroy
fn restore(state: &mut State, removed: Vec<Record>) {
    for record in removed {
        if let Some(id) = record.id() {
            state.unique.insert(&record, id);
            if let Some(table) = state.tables.get_mut(record.record_type()) {
                table.insert(id, record);
            }
        }
    }
}
