//! Field type definitions
//!
//! Supported types:
//! - string / text: UTF-8 string (text only differs in intent)
//! - int: 64-bit signed integer
//! - float: 64-bit floating point (integers accepted)
//! - bool: Boolean
//! - timestamp: RFC 3339 string
//! - array: Homogeneous array with element type

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared field types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    String,
    Text,
    Int,
    Float,
    Bool,
    Timestamp,
    /// Homogeneous array with single element type
    Array {
        element_type: Box<FieldType>,
    },
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Text => "text",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::Timestamp => "timestamp",
            FieldType::Array { .. } => "array",
        }
    }

    /// Returns true if a non-null value is acceptable for this type.
    ///
    /// No coercion: "12" is not an int.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::String | FieldType::Text => value.is_string(),
            FieldType::Int => value.is_i64() || value.is_u64(),
            FieldType::Float => value.is_number(),
            FieldType::Bool => value.is_boolean(),
            FieldType::Timestamp => value
                .as_str()
                .map(|s| DateTime::parse_from_rfc3339(s).is_ok())
                .unwrap_or(false),
            FieldType::Array { element_type } => value
                .as_array()
                .map(|items| items.iter().all(|item| !item.is_null() && element_type.accepts(item)))
                .unwrap_or(false),
        }
    }
}

/// A declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(flatten)]
    pub field_type: FieldType,
    /// Applied when a record is built without this field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default: None,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Int)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Float)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Bool)
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Timestamp)
    }

    pub fn array(name: impl Into<String>, element_type: FieldType) -> Self {
        Self::new(
            name,
            FieldType::Array {
                element_type: Box::new(element_type),
            },
        )
    }

    /// Sets the build-time default
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}
