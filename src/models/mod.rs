//! Issue tracker record catalog
//!
//! Static descriptor tables for every record type the application persists,
//! plus the computed accessors each type exposes. Accessors are pure: they
//! read the record (and any associated records the caller resolved) and
//! never touch the store.
//!
//! ```ignore
//! use recordgate::config::RecordGateConfig;
//! use recordgate::models;
//!
//! let repo = models::repository(RecordGateConfig::default())?;
//! let user = repo.create("user", [("username", json!("root")), ...])?;
//! assert_eq!(models::user::to_reference(&user), "@root");
//! ```

pub mod deployment;
pub mod email;
pub mod environment;
pub mod feature_flag;
pub mod feature_flag_strategy;
pub mod group;
pub mod group_custom_attribute;
pub mod issue;
pub mod label;
pub mod note;
pub mod personal_access_token;
pub mod project;
pub mod project_statistics;
pub mod protected_branch;
pub mod snippet;
pub mod user;

use serde_json::{json, Value};

use crate::config::RecordGateConfig;
use crate::record::Record;
use crate::repo::{RepoResult, Repository};
use crate::schema::{Pattern, RecordType, SchemaError, SchemaRegistry, SchemaResult};

pub const VISIBILITY_PRIVATE: i64 = 0;
pub const VISIBILITY_INTERNAL: i64 = 10;
pub const VISIBILITY_PUBLIC: i64 = 20;

pub(crate) const EMAIL_FORMAT: &str = r"^[A-Za-z0-9._%+'\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$";

/// Every descriptor in the catalog, in registration order
pub fn descriptors() -> SchemaResult<Vec<RecordType>> {
    Ok(vec![
        user::descriptor()?,
        email::descriptor()?,
        personal_access_token::descriptor(),
        group::descriptor(),
        group_custom_attribute::descriptor(),
        project::descriptor(),
        project_statistics::descriptor(),
        issue::descriptor(),
        label::descriptor()?,
        note::descriptor(),
        snippet::descriptor(),
        environment::descriptor(),
        deployment::descriptor()?,
        protected_branch::descriptor(),
        feature_flag::descriptor()?,
        feature_flag_strategy::descriptor(),
    ])
}

/// Builds and verifies the full catalog
pub fn registry() -> SchemaResult<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    for descriptor in descriptors()? {
        registry.register(descriptor)?;
    }
    registry.verify()?;
    Ok(registry)
}

/// A repository over the full catalog, backed by an in-memory store
pub fn repository(config: RecordGateConfig) -> RepoResult<Repository> {
    Repository::open(registry()?, config)
}

/// Compiles a format pattern for `record_type`
pub(crate) fn pattern(record_type: &str, source: &str) -> SchemaResult<Pattern> {
    Pattern::new(source).map_err(|e| SchemaError::invalid_descriptor(record_type, e.to_string()))
}

/// Allowed values for a `visibility_level` field
pub(crate) fn visibility_levels() -> Vec<Value> {
    vec![
        json!(VISIBILITY_PRIVATE),
        json!(VISIBILITY_INTERNAL),
        json!(VISIBILITY_PUBLIC),
    ]
}

pub(crate) fn visibility_level(record: &Record) -> i64 {
    record.get_i64("visibility_level").unwrap_or(VISIBILITY_PRIVATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_verifies() {
        let registry = registry().unwrap();
        assert_eq!(registry.len(), 16);
        for name in ["user", "note", "feature_flag_strategy", "project_statistics"] {
            assert!(registry.contains(name), "missing {}", name);
        }
    }

    #[test]
    fn test_descriptors_survive_json_roundtrip() {
        for descriptor in descriptors().unwrap() {
            let json = serde_json::to_string(&descriptor).unwrap();
            let parsed: RecordType = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, descriptor);
        }
    }

    #[test]
    fn test_invalid_pattern_is_a_descriptor_error() {
        let err = pattern("label", "(").unwrap_err();
        assert_eq!(err.code().code(), "RG_INVALID_DESCRIPTOR");
    }

    #[test]
    fn test_visibility_defaults_to_private() {
        assert_eq!(visibility_level(&Record::new("project")), VISIBILITY_PRIVATE);
    }
}
