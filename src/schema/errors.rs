//! Schema and validation error types
//!
//! Two families live here:
//!
//! - `SchemaError`: something is wrong with a record type descriptor or the
//!   registry (unknown type, duplicate registration, malformed descriptor file).
//! - `ValidationError`: a record instance violates one of its type's rules.
//!   These are accumulated into `ValidationErrors`, never raised one by one.
//!
//! Error codes:
//! - RG_UNKNOWN_RECORD_TYPE (REJECT)
//! - RG_SCHEMA_IMMUTABLE (REJECT)
//! - RG_MALFORMED_SCHEMA (FATAL)
//! - RG_INVALID_DESCRIPTOR (FATAL)
//! - RG_STORE_UNAVAILABLE (REJECT)

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller request rejected
    Reject,
    /// Registry cannot be built; the process must not start serving
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Record type tag not registered
    UnknownRecordType,
    /// Attempt to register a record type twice
    SchemaImmutable,
    /// Descriptor file unreadable or not valid JSON
    MalformedSchema,
    /// Descriptor is internally inconsistent or references unknown types
    InvalidDescriptor,
    /// Store lookup failed while checking uniqueness or associations
    StoreUnavailable,
}

impl SchemaErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::UnknownRecordType => "RG_UNKNOWN_RECORD_TYPE",
            SchemaErrorCode::SchemaImmutable => "RG_SCHEMA_IMMUTABLE",
            SchemaErrorCode::MalformedSchema => "RG_MALFORMED_SCHEMA",
            SchemaErrorCode::InvalidDescriptor => "RG_INVALID_DESCRIPTOR",
            SchemaErrorCode::StoreUnavailable => "RG_STORE_UNAVAILABLE",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::UnknownRecordType
            | SchemaErrorCode::SchemaImmutable
            | SchemaErrorCode::StoreUnavailable => Severity::Reject,
            SchemaErrorCode::MalformedSchema | SchemaErrorCode::InvalidDescriptor => {
                Severity::Fatal
            }
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    record_type: Option<String>,
}

impl SchemaError {
    /// Create an unknown record type error
    pub fn unknown_record_type(record_type: impl Into<String>) -> Self {
        let name = record_type.into();
        Self {
            code: SchemaErrorCode::UnknownRecordType,
            message: format!("Record type '{}' is not registered", name),
            record_type: Some(name),
        }
    }

    /// Create a schema immutable error
    pub fn schema_immutable(record_type: impl Into<String>) -> Self {
        let name = record_type.into();
        Self {
            code: SchemaErrorCode::SchemaImmutable,
            message: format!("Record type '{}' is already registered", name),
            record_type: Some(name),
        }
    }

    /// Create an error for a malformed descriptor file
    pub fn malformed_schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::MalformedSchema,
            message: format!("Malformed descriptor file '{}': {}", path.into(), reason.into()),
            record_type: None,
        }
    }

    /// Create an invalid descriptor error
    pub fn invalid_descriptor(record_type: impl Into<String>, reason: impl Into<String>) -> Self {
        let name = record_type.into();
        Self {
            code: SchemaErrorCode::InvalidDescriptor,
            message: format!("Record type '{}': {}", name, reason.into()),
            record_type: Some(name),
        }
    }

    /// Create an error for a failed store lookup during validation
    pub fn store_unavailable(record_type: impl Into<String>, reason: impl Into<String>) -> Self {
        let name = record_type.into();
        Self {
            code: SchemaErrorCode::StoreUnavailable,
            message: format!("Store lookup for '{}' failed: {}", name, reason.into()),
            record_type: Some(name),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the record type if applicable
    pub fn record_type(&self) -> Option<&str> {
        self.record_type.as_deref()
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Kind of a single rule violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// Absent, blank, or an absent association target
    MissingValue,
    /// Not a number, or a number violating a comparator
    OutOfRange,
    /// Not a member of the allowed set
    NotInSet,
    /// String does not match the required pattern
    FormatMismatch,
    /// Another persisted record holds the same value within scope
    DuplicateValue,
    /// Foreign key present but no target record exists
    UnresolvedRequiredAssociation,
    /// String length outside the allowed bounds
    LengthOutOfRange,
    /// Value type does not match the declared field type
    TypeMismatch,
    /// Field is not declared on the record type
    UnknownField,
}

impl ErrorKind {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::MissingValue => "MISSING_VALUE",
            ErrorKind::OutOfRange => "OUT_OF_RANGE",
            ErrorKind::NotInSet => "NOT_IN_SET",
            ErrorKind::FormatMismatch => "FORMAT_MISMATCH",
            ErrorKind::DuplicateValue => "DUPLICATE_VALUE",
            ErrorKind::UnresolvedRequiredAssociation => "UNRESOLVED_REQUIRED_ASSOCIATION",
            ErrorKind::LengthOutOfRange => "LENGTH_OUT_OF_RANGE",
            ErrorKind::TypeMismatch => "TYPE_MISMATCH",
            ErrorKind::UnknownField => "UNKNOWN_FIELD",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One violation, attributed to a field or association name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Field or association name
    pub attribute: String,
    pub kind: ErrorKind,
    /// Short message, e.g. "can't be blank"
    pub message: String,
}

impl ValidationError {
    pub fn new(attribute: impl Into<String>, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            kind,
            message: message.into(),
        }
    }

    /// Human-readable message prefixed with the attribute, e.g. "Project id can't be blank"
    pub fn full_message(&self) -> String {
        let humanized = self.attribute.replace('_', " ");
        let mut chars = humanized.chars();
        match chars.next() {
            Some(first) => format!("{}{} {}", first.to_uppercase(), chars.as_str(), self.message),
            None => self.message.clone(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.attribute, self.message, self.kind)
    }
}

/// Ordered set of violations from one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a violation; an identical (attribute, kind) pair is recorded once.
    pub fn add(&mut self, attribute: impl Into<String>, kind: ErrorKind, message: impl Into<String>) {
        let error = ValidationError::new(attribute, kind, message);
        if !self
            .errors
            .iter()
            .any(|e| e.attribute == error.attribute && e.kind == error.kind)
        {
            self.errors.push(error);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Errors attributed to one field or association
    pub fn on(&self, attribute: &str) -> Vec<&ValidationError> {
        self.errors.iter().filter(|e| e.attribute == attribute).collect()
    }

    /// Error kinds attributed to one field or association
    pub fn kinds_on(&self, attribute: &str) -> Vec<ErrorKind> {
        self.on(attribute).into_iter().map(|e| e.kind).collect()
    }

    /// Returns true if `attribute` carries an error of `kind`
    pub fn has(&self, attribute: &str, kind: ErrorKind) -> bool {
        self.errors
            .iter()
            .any(|e| e.attribute == attribute && e.kind == kind)
    }

    pub fn full_messages(&self) -> Vec<String> {
        self.errors.iter().map(ValidationError::full_message).collect()
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_messages().join(", "))
    }
}
