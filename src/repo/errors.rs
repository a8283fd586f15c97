//! Repository error types
//!
//! `Invalid` is the only recoverable outcome of a write: the record comes
//! back unsaved with its errors attached. Everything else is an operation
//! failure.

use thiserror::Error;

use crate::association::AssociationError;
use crate::record::RecordRef;
use crate::schema::{SchemaError, ValidationErrors};
use crate::storage::StorageError;

#[derive(Debug, Clone, Error)]
pub enum RepoError {
    #[error("Validation failed: {0}")]
    Invalid(ValidationErrors),

    /// Nothing in the cascade set was removed
    #[error("destroy of {root} ({planned} records) failed: {source}")]
    CascadeDeleteFailure {
        root: RecordRef,
        planned: usize,
        #[source]
        source: StorageError,
    },

    #[error("{0} has not been persisted")]
    NotPersisted(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Association(#[from] AssociationError),
}

impl RepoError {
    pub fn code(&self) -> &'static str {
        match self {
            RepoError::Invalid(_) => "RG_RECORD_INVALID",
            RepoError::CascadeDeleteFailure { .. } => "RG_CASCADE_DELETE_FAILURE",
            RepoError::NotPersisted(_) => "RG_NOT_PERSISTED",
            RepoError::Schema(e) => e.code().code(),
            RepoError::Storage(e) => e.code(),
            RepoError::Association(e) => e.code(),
        }
    }

    /// The attached validation errors, if this is a validation failure
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            RepoError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, RepoError::Invalid(_))
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
