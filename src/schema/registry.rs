//! Record type registry
//!
//! - One descriptor per record type tag; registration is write-once
//! - Descriptors can be loaded from `record_type_<name>.json` files
//! - `verify` runs the cross-type checks once everything is registered
//!
//! Once built, the registry is wrapped in an `Arc` and never mutated again.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::association::AssociationKind;
use super::descriptor::{ForeignKeyLink, RecordType, UniqueConstraint};
use super::errors::{SchemaError, SchemaResult};
use super::types::FieldType;

/// Registry of record type descriptors, keyed by type tag
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    types: BTreeMap<String, Arc<RecordType>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor after checking its structure.
    ///
    /// A type tag can only be registered once.
    pub fn register(&mut self, record_type: RecordType) -> SchemaResult<()> {
        record_type
            .validate_structure()
            .map_err(|e| SchemaError::invalid_descriptor(&record_type.name, e))?;

        if self.types.contains_key(&record_type.name) {
            return Err(SchemaError::schema_immutable(&record_type.name));
        }

        self.types
            .insert(record_type.name.clone(), Arc::new(record_type));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<RecordType>> {
        self.types.get(name)
    }

    /// Like `get`, but an unknown tag is an error
    pub fn require(&self, name: &str) -> SchemaResult<&Arc<RecordType>> {
        self.get(name)
            .ok_or_else(|| SchemaError::unknown_record_type(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// All descriptors, ordered by type tag
    pub fn record_types(&self) -> impl Iterator<Item = &Arc<RecordType>> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Every uniqueness constraint of every registered type
    pub fn unique_constraints(&self) -> Vec<UniqueConstraint> {
        self.types
            .values()
            .flat_map(|t| t.unique_constraints())
            .collect()
    }

    /// Every foreign key link of every registered type
    pub fn foreign_key_links(&self) -> Vec<ForeignKeyLink> {
        self.types
            .values()
            .flat_map(|t| t.foreign_key_links())
            .collect()
    }

    /// Loads every `*.json` descriptor in `dir`, in file name order.
    ///
    /// A missing directory loads nothing. Unreadable or malformed files are
    /// fatal.
    pub fn load_all(&mut self, dir: &Path) -> SchemaResult<usize> {
        if !dir.exists() {
            return Ok(0);
        }

        let entries = fs::read_dir(dir).map_err(|e| {
            SchemaError::malformed_schema(
                dir.display().to_string(),
                format!("Failed to read descriptor directory: {}", e),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::malformed_schema(
                    dir.display().to_string(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?;
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            self.load_file(path)?;
        }

        Ok(paths.len())
    }

    fn load_file(&mut self, path: &Path) -> SchemaResult<()> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to read file: {}", e),
            )
        })?;

        let record_type: RecordType = serde_json::from_str(&content).map_err(|e| {
            SchemaError::malformed_schema(path.display().to_string(), format!("Invalid JSON: {}", e))
        })?;

        self.register(record_type)
    }

    /// Writes a descriptor to `dir/record_type_<name>.json`.
    ///
    /// Existing files are never overwritten.
    pub fn save(dir: &Path, record_type: &RecordType) -> SchemaResult<PathBuf> {
        let path = dir.join(format!("record_type_{}.json", record_type.name));

        if path.exists() {
            return Err(SchemaError::schema_immutable(&record_type.name));
        }

        fs::create_dir_all(dir).map_err(|e| {
            SchemaError::malformed_schema(
                dir.display().to_string(),
                format!("Failed to create descriptor directory: {}", e),
            )
        })?;

        let content = serde_json::to_string_pretty(record_type).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to serialize descriptor: {}", e),
            )
        })?;

        fs::write(&path, content).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to write file: {}", e),
            )
        })?;

        Ok(path)
    }

    /// Cross-type consistency checks.
    ///
    /// - every association target is registered
    /// - `has_*` foreign keys (and type tags) are declared on the target
    /// - `as_polymorphic` names a polymorphic `belongs_to` on the target
    /// - every `has_one` is backed by a uniqueness rule on its foreign key
    pub fn verify(&self) -> SchemaResult<()> {
        for record_type in self.types.values() {
            for assoc in &record_type.associations {
                let target = match assoc.target_type() {
                    Some(target) => target,
                    None => continue,
                };

                let target_type = self.get(target).ok_or_else(|| {
                    SchemaError::invalid_descriptor(
                        &record_type.name,
                        format!("association '{}' targets unknown type '{}'", assoc.name, target),
                    )
                })?;

                if assoc.kind == AssociationKind::BelongsTo {
                    continue;
                }

                match target_type.field_def(&assoc.foreign_key) {
                    Some(def) if def.field_type == FieldType::Int => {}
                    _ => {
                        return Err(SchemaError::invalid_descriptor(
                            &record_type.name,
                            format!(
                                "association '{}' needs int field '{}' on '{}'",
                                assoc.name, assoc.foreign_key, target
                            ),
                        ))
                    }
                }

                let type_field = assoc.type_field();
                if let Some(poly) = &assoc.as_polymorphic {
                    let backed = target_type
                        .association_def(poly)
                        .map(|a| a.is_polymorphic())
                        .unwrap_or(false);
                    if !backed {
                        return Err(SchemaError::invalid_descriptor(
                            &record_type.name,
                            format!(
                                "association '{}' expects polymorphic '{}' on '{}'",
                                assoc.name, poly, target
                            ),
                        ));
                    }
                }

                if assoc.kind == AssociationKind::HasOne {
                    let unique = target_type.unique_constraints().iter().any(|c| {
                        c.field == assoc.foreign_key
                            && c.scope
                                .iter()
                                .all(|s| Some(s.as_str()) == type_field.as_deref())
                    });
                    if !unique {
                        return Err(SchemaError::invalid_descriptor(
                            &record_type.name,
                            format!(
                                "has_one '{}' requires '{}' to be unique on '{}'",
                                assoc.name, assoc.foreign_key, target
                            ),
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}
