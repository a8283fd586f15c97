//! Storage error types
//!
//! Error codes:
//! - RG_UNIQUE_VIOLATION
//! - RG_RECORD_NOT_FOUND
//! - RG_UNKNOWN_TABLE
//! - RG_STORE_POISONED
//! - RG_FAULT_INJECTED
//! - RG_MISSING_PARENT
//! - RG_LIVE_DEPENDENT

use thiserror::Error;

use crate::record::RecordRef;

/// Errors raised at the persistence boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("unique constraint on '{record_type}.{field}' violated")]
    UniqueViolation { record_type: String, field: String },

    #[error("record {0} not found")]
    NotFound(RecordRef),

    #[error("no table for record type '{0}'")]
    UnknownTable(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("fault injected at '{0}'")]
    FaultInjected(String),

    #[error("'{association}' points at {parent}, which does not exist")]
    MissingParent { association: String, parent: RecordRef },

    #[error("{dependent} still references {parent}")]
    LiveDependent {
        dependent: RecordRef,
        parent: RecordRef,
    },
}

impl StorageError {
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::UniqueViolation { .. } => "RG_UNIQUE_VIOLATION",
            StorageError::NotFound(_) => "RG_RECORD_NOT_FOUND",
            StorageError::UnknownTable(_) => "RG_UNKNOWN_TABLE",
            StorageError::Poisoned => "RG_STORE_POISONED",
            StorageError::FaultInjected(_) => "RG_FAULT_INJECTED",
            StorageError::MissingParent { .. } => "RG_MISSING_PARENT",
            StorageError::LiveDependent { .. } => "RG_LIVE_DEPENDENT",
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
