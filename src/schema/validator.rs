//! Record validator
//!
//! Validation order:
//! 1. Record type must be registered (otherwise a `SchemaError`)
//! 2. Undeclared fields (`UnknownField`, strict mode only)
//! 3. Declared field types (`TypeMismatch`)
//! 4. Field rules, in declaration order
//! 5. Required `belongs_to` associations
//!
//! Violations are accumulated, never short-circuited. The validator reads the
//! store for uniqueness and association checks but never writes to it.

use serde_json::Value;

use super::association::{Association, AssociationKind, AssociationTarget};
use super::descriptor::RecordType;
use super::errors::{ErrorKind, SchemaError, SchemaResult, ValidationErrors};
use super::registry::SchemaRegistry;
use super::rules::{FieldRule, NumericBounds, Pattern, RuleKind};
use crate::record::{Record, RecordId};
use crate::storage::{RecordStore, ScopePredicate};

pub(crate) const MSG_BLANK: &str = "can't be blank";
pub(crate) const MSG_MUST_EXIST: &str = "must exist";
pub(crate) const MSG_TAKEN: &str = "has already been taken";
const MSG_NOT_A_NUMBER: &str = "is not a number";
const MSG_NOT_INCLUDED: &str = "is not included in the list";
const MSG_INVALID: &str = "is invalid";
const MSG_UNDECLARED: &str = "is not a declared attribute";
const MSG_WRONG_TYPE: &str = "is the wrong type";

/// Validates record instances against their registered descriptors.
pub struct RecordValidator<'a> {
    registry: &'a SchemaRegistry,
    store: &'a dyn RecordStore,
    strict_fields: bool,
}

impl<'a> RecordValidator<'a> {
    pub fn new(registry: &'a SchemaRegistry, store: &'a dyn RecordStore) -> Self {
        Self {
            registry,
            store,
            strict_fields: true,
        }
    }

    /// Enables or disables the undeclared-field check
    pub fn strict_fields(mut self, strict: bool) -> Self {
        self.strict_fields = strict;
        self
    }

    /// Validates `record`, returning every violation found.
    ///
    /// # Errors
    ///
    /// - `RG_UNKNOWN_RECORD_TYPE` if the record's type is not registered
    /// - `RG_STORE_UNAVAILABLE` if a store lookup fails
    pub fn validate(&self, record: &Record) -> SchemaResult<ValidationErrors> {
        let descriptor = self.registry.require(record.record_type())?;
        let mut errors = ValidationErrors::new();

        if self.strict_fields {
            for field in record.fields().keys() {
                if descriptor.field_def(field).is_none() {
                    errors.add(field.clone(), ErrorKind::UnknownField, MSG_UNDECLARED);
                }
            }
        }

        for def in &descriptor.fields {
            if let Some(value) = record.get(&def.name) {
                if !def.field_type.accepts(value) {
                    errors.add(def.name.clone(), ErrorKind::TypeMismatch, MSG_WRONG_TYPE);
                }
            }
        }

        for rule in &descriptor.rules {
            self.check_rule(descriptor, record, rule, &mut errors)?;
        }

        for assoc in descriptor
            .associations
            .iter()
            .filter(|a| a.kind == AssociationKind::BelongsTo && a.required)
        {
            if errors.has(&assoc.name, ErrorKind::MissingValue) {
                continue;
            }
            match self.target_state(record, assoc)? {
                TargetState::Resolved => {}
                TargetState::KeyAbsent => {
                    errors.add(assoc.name.clone(), ErrorKind::MissingValue, MSG_MUST_EXIST)
                }
                TargetState::Unresolved => errors.add(
                    assoc.name.clone(),
                    ErrorKind::UnresolvedRequiredAssociation,
                    MSG_MUST_EXIST,
                ),
            }
        }

        Ok(errors)
    }

    fn check_rule(
        &self,
        descriptor: &RecordType,
        record: &Record,
        rule: &FieldRule,
        errors: &mut ValidationErrors,
    ) -> SchemaResult<()> {
        let value = record.get(&rule.field);
        if rule.allow_nil && value.is_none() {
            return Ok(());
        }

        match &rule.rule {
            RuleKind::Presence => {
                let present = match descriptor.association_def(&rule.field) {
                    Some(assoc) if descriptor.field_def(&rule.field).is_none() => {
                        self.target_state(record, assoc)? == TargetState::Resolved
                    }
                    _ => !is_blank(value),
                };
                if !present {
                    errors.add(rule.field.clone(), ErrorKind::MissingValue, MSG_BLANK);
                }
            }
            RuleKind::Length { min, max } => {
                if let Some(message) = check_length(value, *min, *max) {
                    errors.add(rule.field.clone(), ErrorKind::LengthOutOfRange, message);
                }
            }
            RuleKind::Numericality(bounds) => {
                if let Some(message) = check_numericality(value, bounds) {
                    errors.add(rule.field.clone(), ErrorKind::OutOfRange, message);
                }
            }
            RuleKind::Inclusion { allowed } => {
                let candidate = value.unwrap_or(&Value::Null);
                if !allowed.iter().any(|a| json_eq(a, candidate)) {
                    errors.add(rule.field.clone(), ErrorKind::NotInSet, MSG_NOT_INCLUDED);
                }
            }
            RuleKind::Format { pattern } => {
                if !format_matches(value, pattern) {
                    errors.add(rule.field.clone(), ErrorKind::FormatMismatch, MSG_INVALID);
                }
            }
            RuleKind::Uniqueness {
                scope,
                case_sensitive,
            } => {
                if let Some(value) = value {
                    let predicate =
                        uniqueness_predicate(record, &rule.field, value, scope, *case_sensitive);
                    let taken = self
                        .store
                        .find_matching(record.record_type(), &predicate)
                        .map_err(|e| SchemaError::store_unavailable(record.record_type(), e.to_string()))?;
                    if !taken.is_empty() {
                        errors.add(rule.field.clone(), ErrorKind::DuplicateValue, MSG_TAKEN);
                    }
                }
            }
        }

        Ok(())
    }

    fn target_state(&self, record: &Record, assoc: &Association) -> SchemaResult<TargetState> {
        let id = match record.get_id(&assoc.foreign_key) {
            Some(id) => id,
            None => return Ok(TargetState::KeyAbsent),
        };

        let target = match &assoc.target {
            AssociationTarget::Type(name) => name.as_str(),
            AssociationTarget::Polymorphic => {
                let type_field = format!("{}_type", assoc.name);
                match record.get_str(&type_field) {
                    Some(tag) if !tag.trim().is_empty() => tag,
                    _ => return Ok(TargetState::KeyAbsent),
                }
            }
        };

        if !self.registry.contains(target) {
            return Ok(TargetState::Unresolved);
        }

        self.exists(target, id)
    }

    fn exists(&self, record_type: &str, id: RecordId) -> SchemaResult<TargetState> {
        let found = self
            .store
            .find(record_type, id)
            .map_err(|e| SchemaError::store_unavailable(record_type, e.to_string()))?;
        Ok(match found {
            Some(_) => TargetState::Resolved,
            None => TargetState::Unresolved,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetState {
    Resolved,
    KeyAbsent,
    Unresolved,
}

/// Absent, null, whitespace-only strings and empty arrays are blank
pub(crate) fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn check_length(value: Option<&Value>, min: Option<usize>, max: Option<usize>) -> Option<String> {
    let length = match value {
        None => 0,
        Some(Value::String(s)) => s.chars().count(),
        Some(Value::Array(items)) => items.len(),
        Some(_) => return None,
    };

    if let Some(min) = min {
        if length < min {
            return Some(format!("is too short (minimum is {} characters)", min));
        }
    }
    if let Some(max) = max {
        if length > max {
            return Some(format!("is too long (maximum is {} characters)", max));
        }
    }
    None
}

fn check_numericality(value: Option<&Value>, bounds: &NumericBounds) -> Option<String> {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    };

    match number {
        Some(number) => bounds.check(number).err(),
        None => Some(MSG_NOT_A_NUMBER.to_string()),
    }
}

fn format_matches(value: Option<&Value>, pattern: &Pattern) -> bool {
    match value {
        None => pattern.is_match(""),
        Some(Value::String(s)) => pattern.is_match(s),
        Some(Value::Number(n)) => pattern.is_match(&n.to_string()),
        Some(Value::Bool(b)) => pattern.is_match(&b.to_string()),
        Some(_) => false,
    }
}

/// JSON equality where `1` and `1.0` are the same number
pub(crate) fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn uniqueness_predicate(
    record: &Record,
    field: &str,
    value: &Value,
    scope: &[String],
    case_sensitive: bool,
) -> ScopePredicate {
    let mut predicate = if case_sensitive {
        ScopePredicate::new().eq(field, value.clone())
    } else {
        ScopePredicate::new().eq_ignore_case(field, value.clone())
    };
    for scope_field in scope {
        let scope_value = record.get(scope_field).cloned().unwrap_or(Value::Null);
        predicate = predicate.eq(scope_field.clone(), scope_value);
    }
    predicate.excluding(record.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDef, NumericBounds};
    use crate::storage::MemoryStore;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .register(RecordType::new("project").field(FieldDef::string("name")))
            .unwrap();
        registry
            .register(
                RecordType::new("label")
                    .field(FieldDef::string("title"))
                    .field(FieldDef::string("color"))
                    .field(FieldDef::float("share"))
                    .validates(FieldRule::presence("title"))
                    .validates(FieldRule::max_length("title", 10))
                    .validates(
                        FieldRule::format("color", Pattern::new("^#[0-9a-fA-F]{6}$").unwrap())
                            .allow_nil(),
                    )
                    .validates(
                        FieldRule::numericality(
                            "share",
                            NumericBounds::new()
                                .greater_than_or_equal_to(0.0)
                                .less_than_or_equal_to(100.0),
                        )
                        .allow_nil(),
                    )
                    .validates(FieldRule::uniqueness("title").scoped_to(&["project_id"]))
                    .belongs_to(Association::belongs_to("project", "project")),
            )
            .unwrap();
        registry
    }

    fn validate(registry: &SchemaRegistry, store: &MemoryStore, record: &Record) -> ValidationErrors {
        RecordValidator::new(registry, store).validate(record).unwrap()
    }

    #[test]
    fn test_unknown_type_is_schema_error() {
        let registry = registry();
        let store = MemoryStore::for_registry(&registry);
        let err = RecordValidator::new(&registry, &store)
            .validate(&Record::new("widget"))
            .unwrap_err();
        assert_eq!(err.code().code(), "RG_UNKNOWN_RECORD_TYPE");
    }

    #[test]
    fn test_errors_accumulate() {
        let registry = registry();
        let store = MemoryStore::for_registry(&registry);
        let record = Record::new("label")
            .with("color", "000000")
            .with("share", 100.1)
            .with("bogus", 1);

        let errors = validate(&registry, &store, &record);
        assert!(errors.has("bogus", ErrorKind::UnknownField));
        assert!(errors.has("title", ErrorKind::MissingValue));
        assert!(errors.has("color", ErrorKind::FormatMismatch));
        assert!(errors.has("share", ErrorKind::OutOfRange));
        assert!(errors.has("project", ErrorKind::MissingValue));
    }

    #[test]
    fn test_lenient_mode_ignores_undeclared_fields() {
        let registry = registry();
        let store = MemoryStore::for_registry(&registry);
        let record = Record::new("project").with("name", "gitlab").with("bogus", 1);

        let errors = RecordValidator::new(&registry, &store)
            .strict_fields(false)
            .validate(&record)
            .unwrap();
        assert!(errors.is_empty());
    }

    #[test]
    fn test_type_mismatch() {
        let registry = registry();
        let store = MemoryStore::for_registry(&registry);
        let record = Record::new("project").with("name", 42);
        let errors = validate(&registry, &store, &record);
        assert_eq!(errors.kinds_on("name"), vec![ErrorKind::TypeMismatch]);
    }

    #[test]
    fn test_unresolved_foreign_key() {
        let registry = registry();
        let store = MemoryStore::for_registry(&registry);
        let record = Record::new("label").with("title", "bug").with("project_id", 999);

        let errors = validate(&registry, &store, &record);
        assert_eq!(
            errors.kinds_on("project"),
            vec![ErrorKind::UnresolvedRequiredAssociation]
        );
        assert_eq!(errors.on("project")[0].message, "must exist");
    }

    #[test]
    fn test_length_message() {
        let registry = registry();
        let store = MemoryStore::for_registry(&registry);
        let record = Record::new("label").with("title", "a".repeat(11));
        let errors = validate(&registry, &store, &record);
        assert_eq!(
            errors.on("title")[0].message,
            "is too long (maximum is 10 characters)"
        );
    }

    #[test]
    fn test_numericality_parses_strings() {
        let bounds = NumericBounds::new().greater_than_or_equal_to(0.0);
        assert_eq!(check_numericality(Some(&json!("12")), &bounds), None);
        assert_eq!(
            check_numericality(Some(&json!("twelve")), &bounds),
            Some("is not a number".to_string())
        );
        assert_eq!(
            check_numericality(None, &bounds),
            Some("is not a number".to_string())
        );
    }

    #[test]
    fn test_blankness() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&json!("   "))));
        assert!(is_blank(Some(&json!([]))));
        assert!(!is_blank(Some(&json!(0))));
        assert!(!is_blank(Some(&json!(false))));
    }

    #[test]
    fn test_inclusion_number_equality() {
        assert!(json_eq(&json!(0), &json!(0.0)));
        assert!(!json_eq(&json!(0), &json!("0")));
        assert!(json_eq(&Value::Null, &Value::Null));
    }
}
