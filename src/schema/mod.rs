//! Record type descriptors and validation
//!
//! Record types are declared as static descriptor tables at process start
//! and are read-only afterwards.
//!
//! # Design Principles
//!
//! - Descriptors are data: fields, rules, associations and callbacks
//! - One registration per type tag; no runtime mutation
//! - Validation accumulates every violation in one pass
//! - No implicit type coercion
//! - Deterministic validation

mod association;
mod callbacks;
mod descriptor;
mod errors;
mod registry;
mod rules;
mod types;
mod validator;

pub use association::{Association, AssociationKind, AssociationTarget, Dependent};
pub use callbacks::{run_normalizers, run_token_callbacks, Callback, Normalizer};
pub use descriptor::{ForeignKeyLink, RecordType, UniqueConstraint};
pub use errors::{
    ErrorKind, SchemaError, SchemaErrorCode, SchemaResult, Severity, ValidationError,
    ValidationErrors,
};
pub use registry::SchemaRegistry;
pub use rules::{FieldRule, NumericBounds, Pattern, RuleKind};
pub use types::{FieldDef, FieldType};
pub use validator::RecordValidator;

pub(crate) use validator::{MSG_MUST_EXIST, MSG_TAKEN};
