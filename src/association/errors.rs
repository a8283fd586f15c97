//! Association error types

use thiserror::Error;

use crate::schema::SchemaError;
use crate::storage::StorageError;

/// Errors raised while resolving associations
#[derive(Debug, Clone, Error)]
pub enum AssociationError {
    #[error("record type '{record_type}' has no association '{name}'")]
    UnknownAssociation { record_type: String, name: String },

    /// A one-to-one association matched more than one record
    #[error("has_one '{name}' of {owner} matched {count} records")]
    Ambiguous {
        owner: String,
        name: String,
        count: usize,
    },

    #[error("association '{name}' is not {expected}")]
    Cardinality { name: String, expected: &'static str },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AssociationError {
    pub fn code(&self) -> &'static str {
        match self {
            AssociationError::UnknownAssociation { .. } => "RG_UNKNOWN_ASSOCIATION",
            AssociationError::Ambiguous { .. } => "RG_AMBIGUOUS_ASSOCIATION",
            AssociationError::Cardinality { .. } => "RG_ASSOCIATION_CARDINALITY",
            AssociationError::Schema(e) => e.code().code(),
            AssociationError::Storage(e) => e.code(),
        }
    }
}

/// Result type for association operations
pub type AssociationResult<T> = Result<T, AssociationError>;
