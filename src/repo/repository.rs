//! Record lifecycle facade
//!
//! unsaved -> validated (valid | invalid) -> persisted -> destroyed
//!
//! - `save` never persists an invalid record
//! - a storage-level uniqueness conflict comes back as a `DuplicateValue`
//!   validation error, not as a storage failure
//! - `destroy` removes the whole cascade set or nothing
//!
//! Every operation logs one structured event and bumps the lifecycle
//! counters.

use std::sync::Arc;

use serde_json::Value;

use super::errors::{RepoError, RepoResult};
use crate::association::{AssociationResolver, Resolved};
use crate::config::RecordGateConfig;
use crate::observability::{log_event_with_fields, Event, Logger, MetricsRegistry};
use crate::record::{Record, RecordId, RecordRef};
use crate::schema::{
    run_normalizers, run_token_callbacks, ErrorKind, RecordValidator, SchemaRegistry,
    ValidationErrors, MSG_MUST_EXIST, MSG_TAKEN,
};
use crate::storage::{MemoryStore, RecordStore, StorageError};

/// Outcome of a successful destroy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestroyReport {
    pub root: RecordRef,
    /// Every removed record, children before parents, ending with `root`
    pub destroyed: Vec<RecordRef>,
}

impl DestroyReport {
    pub fn count(&self) -> usize {
        self.destroyed.len()
    }

    /// Records removed besides the root
    pub fn dependents(&self) -> usize {
        self.destroyed.len().saturating_sub(1)
    }
}

/// Validation, persistence and association access for every registered type
pub struct Repository {
    registry: Arc<SchemaRegistry>,
    store: Arc<dyn RecordStore>,
    config: RecordGateConfig,
    metrics: Arc<MetricsRegistry>,
}

impl Repository {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        store: Arc<dyn RecordStore>,
        config: RecordGateConfig,
    ) -> Self {
        Self {
            registry,
            store,
            config,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    /// Boots a repository over an in-memory store.
    ///
    /// Loads extra descriptors from `config.schema_dir`, verifies the
    /// registry and applies the configured log level.
    pub fn open(mut registry: SchemaRegistry, config: RecordGateConfig) -> RepoResult<Self> {
        Logger::set_min_severity(config.log_level);
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("log_level", config.log_level.as_str()),
                ("strict_fields", if config.strict_fields { "true" } else { "false" }),
            ],
        );

        if let Some(dir) = &config.schema_dir {
            registry.load_all(dir)?;
        }
        registry.verify()?;

        let types = registry.len().to_string();
        log_event_with_fields(Event::SchemasLoaded, &[("record_types", &types)]);

        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::for_registry(&registry));
        Ok(Self::new(Arc::new(registry), store, config))
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn config(&self) -> &RecordGateConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Constructs an unsaved record, applying field defaults for every
    /// declared field the caller omits.
    pub fn build<K, I>(&self, record_type: &str, fields: I) -> RepoResult<Record>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let descriptor = self.registry.require(record_type)?;
        let mut record = Record::new(record_type);
        for def in &descriptor.fields {
            if let Some(default) = &def.default {
                record.set(def.name.clone(), default.clone());
            }
        }
        record.assign(fields);
        Ok(record)
    }

    /// Normalizes and validates `record`, attaching the errors to it.
    ///
    /// Validating an unmodified record again yields the same errors.
    pub fn validate(&self, record: &mut Record) -> RepoResult<ValidationErrors> {
        let descriptor = self.registry.require(record.record_type())?;
        run_normalizers(&descriptor.callbacks, record);

        let errors = RecordValidator::new(&self.registry, self.store.as_ref())
            .strict_fields(self.config.strict_fields)
            .validate(record)?;

        self.metrics.increment_validations();
        let count = errors.len().to_string();
        log_event_with_fields(
            Event::RecordValidated,
            &[("errors", &count), ("record_type", record.record_type())],
        );

        record.set_errors(errors.clone());
        Ok(errors)
    }

    /// Validates and persists `record`.
    ///
    /// On `RepoError::Invalid` the record is left unsaved with its errors
    /// attached. On success it carries its identity and timestamps.
    pub fn save(&self, record: &mut Record) -> RepoResult<()> {
        let errors = self.validate(record)?;
        if !errors.is_empty() {
            self.reject(record);
            return Err(RepoError::Invalid(errors));
        }

        let descriptor = self.registry.require(record.record_type())?;
        run_token_callbacks(&descriptor.callbacks, record, self.config.token_bytes);

        match self.store.commit(record) {
            Ok(stored) => {
                *record = stored;
                self.metrics.increment_persisted();
                let id = record.id().map(|id| id.to_string()).unwrap_or_default();
                log_event_with_fields(
                    Event::RecordPersisted,
                    &[("id", &id), ("record_type", record.record_type())],
                );
                Ok(())
            }
            Err(StorageError::UniqueViolation { field, .. }) => {
                self.metrics.increment_unique_conflicts();
                record
                    .errors_mut()
                    .add(field, ErrorKind::DuplicateValue, MSG_TAKEN);
                self.reject(record);
                Err(RepoError::Invalid(record.errors().clone()))
            }
            Err(StorageError::MissingParent { association, .. }) => {
                record.errors_mut().add(
                    association,
                    ErrorKind::UnresolvedRequiredAssociation,
                    MSG_MUST_EXIST,
                );
                self.reject(record);
                Err(RepoError::Invalid(record.errors().clone()))
            }
            Err(e) => {
                log_event_with_fields(
                    Event::CommitFailed,
                    &[("error", &e.to_string()), ("record_type", record.record_type())],
                );
                Err(RepoError::Storage(e))
            }
        }
    }

    fn reject(&self, record: &Record) {
        self.metrics.increment_rejections();
        let errors = record.errors().to_string();
        log_event_with_fields(
            Event::RecordRejected,
            &[("errors", &errors), ("record_type", record.record_type())],
        );
    }

    /// Builds and saves a record in one step
    pub fn create<K, I>(&self, record_type: &str, fields: I) -> RepoResult<Record>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut record = self.build(record_type, fields)?;
        self.save(&mut record)?;
        Ok(record)
    }

    /// Assigns `fields` and saves
    pub fn update<K, I>(&self, record: &mut Record, fields: I) -> RepoResult<()>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        record.assign(fields);
        self.save(record)
    }

    /// Destroys `record` and its whole cascade set atomically.
    ///
    /// # Errors
    ///
    /// `CascadeDeleteFailure` if the store rejects the destroy, including
    /// when a child committed after the cascade set was computed still
    /// points at a record in it. Nothing is removed in that case.
    pub fn destroy(&self, record: &Record) -> RepoResult<DestroyReport> {
        let root = record
            .reference()
            .ok_or_else(|| RepoError::NotPersisted(record.record_type().to_string()))?;

        let plan = AssociationResolver::new(&self.registry, self.store.as_ref()).cascade_set(record)?;

        match self.store.commit_destroy(&plan) {
            Ok(removed) => {
                self.metrics.add_destroyed(removed as u64);
                let count = removed.to_string();
                let root_label = root.to_string();
                log_event_with_fields(
                    Event::RecordDestroyed,
                    &[("destroyed", &count), ("root", &root_label)],
                );
                Ok(DestroyReport {
                    root,
                    destroyed: plan,
                })
            }
            Err(source) => {
                self.metrics.increment_cascade_failures();
                let root_label = root.to_string();
                let planned = plan.len().to_string();
                log_event_with_fields(
                    Event::CascadeDestroyFailed,
                    &[
                        ("error", &source.to_string()),
                        ("planned", &planned),
                        ("root", &root_label),
                    ],
                );
                Err(RepoError::CascadeDeleteFailure {
                    root,
                    planned: plan.len(),
                    source,
                })
            }
        }
    }

    pub fn find(&self, record_type: &str, id: RecordId) -> RepoResult<Option<Record>> {
        self.registry.require(record_type)?;
        Ok(self.store.find(record_type, id)?)
    }

    /// Fresh copy of a persisted record from the store
    pub fn reload(&self, record: &Record) -> RepoResult<Record> {
        let reference = record
            .reference()
            .ok_or_else(|| RepoError::NotPersisted(record.record_type().to_string()))?;
        self.store
            .find(&reference.record_type, reference.id)?
            .ok_or(RepoError::Storage(StorageError::NotFound(reference)))
    }

    pub fn count(&self, record_type: &str) -> RepoResult<usize> {
        self.registry.require(record_type)?;
        Ok(self.store.count(record_type)?)
    }

    pub fn association(&self, record: &Record, name: &str) -> RepoResult<Resolved> {
        Ok(self.resolver().resolve(record, name)?)
    }

    pub fn association_one(&self, record: &Record, name: &str) -> RepoResult<Option<Record>> {
        Ok(self.resolver().resolve_one(record, name)?)
    }

    pub fn association_many(&self, record: &Record, name: &str) -> RepoResult<Vec<Record>> {
        Ok(self.resolver().resolve_many(record, name)?)
    }

    fn resolver(&self) -> AssociationResolver<'_> {
        AssociationResolver::new(&self.registry, self.store.as_ref())
    }
}
