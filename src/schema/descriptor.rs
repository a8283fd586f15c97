//! Record type descriptors
//!
//! A `RecordType` is a static table: fields, rules, associations and
//! callbacks, built once at startup and shared read-only afterwards.
//!
//! ```ignore
//! let label = RecordType::new("label")
//!     .field(FieldDef::string("title"))
//!     .field(FieldDef::string("color"))
//!     .validates(FieldRule::presence("title"))
//!     .validates(FieldRule::uniqueness("title").scoped_to(&["project_id"]))
//!     .belongs_to(Association::belongs_to("project", "project"));
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::association::{Association, AssociationKind};
use super::callbacks::Callback;
use super::rules::{FieldRule, RuleKind};
use super::types::{FieldDef, FieldType};
use crate::record::{Record, RecordRef};

/// Complete descriptor of one record type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub rules: Vec<FieldRule>,
    #[serde(default)]
    pub associations: Vec<Association>,
    #[serde(default)]
    pub callbacks: Vec<Callback>,
}

/// A uniqueness constraint, as the storage layer sees it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueConstraint {
    pub record_type: String,
    pub field: String,
    pub scope: Vec<String>,
    pub case_sensitive: bool,
}

/// A foreign key the storage layer keeps consistent.
///
/// `record_type` holds `foreign_key`. Without a `type_field` the key points
/// at `target`. With one, the tag names the parent type; if `target` is
/// also set the link only covers records tagged with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForeignKeyLink {
    pub record_type: String,
    /// The holder's association name, for error reporting
    pub association: String,
    pub foreign_key: String,
    pub type_field: Option<String>,
    pub target: Option<String>,
    /// The parent must exist when the holder is committed
    pub required: bool,
    /// The holder is destroyed with its parent
    pub cascades: bool,
}

impl ForeignKeyLink {
    /// The parent `record` points at through this link, if any
    pub fn parent_of(&self, record: &Record) -> Option<RecordRef> {
        if record.record_type() != self.record_type {
            return None;
        }
        let id = record.get_id(&self.foreign_key)?;
        let parent_type = match (&self.type_field, &self.target) {
            (Some(type_field), target) => {
                let tag = record.get_str(type_field)?;
                if target.as_deref().map_or(false, |t| t != tag) {
                    return None;
                }
                tag
            }
            (None, Some(target)) => target.as_str(),
            (None, None) => return None,
        };
        Some(RecordRef::new(parent_type, id))
    }
}

impl RecordType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
            rules: Vec::new(),
            associations: Vec::new(),
            callbacks: Vec::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares a field. A later declaration with the same name replaces it.
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.retain(|f| f.name != field.name);
        self.fields.push(field);
        self
    }

    pub fn validates(mut self, rule: FieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Declares any association. `belongs_to` also declares its key (and
    /// type tag, when polymorphic) unless already declared.
    pub fn association(mut self, association: Association) -> Self {
        if association.kind == AssociationKind::BelongsTo {
            if self.field_def(&association.foreign_key).is_none() {
                self.fields.push(FieldDef::int(association.foreign_key.clone()));
            }
            if let Some(type_field) = association.type_field() {
                if self.field_def(&type_field).is_none() {
                    self.fields.push(FieldDef::string(type_field));
                }
            }
        }
        self.associations.push(association);
        self
    }

    pub fn belongs_to(self, association: Association) -> Self {
        self.association(association)
    }

    pub fn has_many(self, association: Association) -> Self {
        self.association(association)
    }

    pub fn has_one(self, association: Association) -> Self {
        self.association(association)
    }

    pub fn callback(mut self, callback: Callback) -> Self {
        self.callbacks.push(callback);
        self
    }

    /// Looks up a declared field
    pub fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a declared association
    pub fn association_def(&self, name: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.name == name)
    }

    pub fn rules_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldRule> + 'a {
        self.rules.iter().filter(move |r| r.field == field)
    }

    /// Associations whose records are destroyed with this one
    pub fn cascading_associations(&self) -> impl Iterator<Item = &Association> {
        self.associations.iter().filter(|a| a.cascades())
    }

    /// Every uniqueness rule, as a storage constraint
    pub fn unique_constraints(&self) -> Vec<UniqueConstraint> {
        self.rules
            .iter()
            .filter_map(|rule| match &rule.rule {
                RuleKind::Uniqueness {
                    scope,
                    case_sensitive,
                } => Some(UniqueConstraint {
                    record_type: self.name.clone(),
                    field: rule.field.clone(),
                    scope: scope.clone(),
                    case_sensitive: *case_sensitive,
                }),
                _ => None,
            })
            .collect()
    }

    /// Foreign keys this type declares or cascades through.
    ///
    /// Every `belongs_to` yields a link held by this type. Every cascading
    /// `has_one`/`has_many` yields a link held by the target type.
    pub fn foreign_key_links(&self) -> Vec<ForeignKeyLink> {
        self.associations
            .iter()
            .filter_map(|assoc| match assoc.kind {
                AssociationKind::BelongsTo => Some(ForeignKeyLink {
                    record_type: self.name.clone(),
                    association: assoc.name.clone(),
                    foreign_key: assoc.foreign_key.clone(),
                    type_field: assoc.type_field(),
                    target: assoc.target_type().map(str::to_string),
                    required: assoc.required,
                    cascades: false,
                }),
                AssociationKind::HasOne | AssociationKind::HasMany if assoc.cascades() => {
                    let holder = assoc.target_type()?;
                    let association = assoc.as_polymorphic.clone().unwrap_or_else(|| {
                        assoc.foreign_key.trim_end_matches("_id").to_string()
                    });
                    Some(ForeignKeyLink {
                        record_type: holder.to_string(),
                        association,
                        foreign_key: assoc.foreign_key.clone(),
                        type_field: assoc.type_field(),
                        target: Some(self.name.clone()),
                        required: false,
                        cascades: true,
                    })
                }
                _ => None,
            })
            .collect()
    }

    /// Returns true if `field` is unique on its own (no scope)
    pub fn has_unscoped_uniqueness(&self, field: &str) -> bool {
        self.unique_constraints()
            .iter()
            .any(|c| c.field == field && c.scope.is_empty())
    }

    /// Checks the descriptor for internal consistency.
    ///
    /// Cross-type checks (targets exist, has_one keys are unique) belong to
    /// `SchemaRegistry::verify`.
    pub fn validate_structure(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("record type name must not be empty".into());
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(format!("field '{}' declared twice", field.name));
            }
            if let Some(default) = &field.default {
                if !default.is_null() && !field.field_type.accepts(default) {
                    return Err(format!(
                        "default for '{}' is not a valid {}",
                        field.name,
                        field.field_type.type_name()
                    ));
                }
            }
        }

        let mut assoc_names = HashSet::new();
        for assoc in &self.associations {
            if !assoc_names.insert(assoc.name.as_str()) {
                return Err(format!("association '{}' declared twice", assoc.name));
            }
            if seen.contains(assoc.name.as_str()) {
                return Err(format!("association '{}' shadows a field", assoc.name));
            }
            if assoc.kind == AssociationKind::BelongsTo {
                match self.field_def(&assoc.foreign_key) {
                    Some(def) if def.field_type == FieldType::Int => {}
                    Some(_) => {
                        return Err(format!(
                            "foreign key '{}' must be an int field",
                            assoc.foreign_key
                        ))
                    }
                    None => {
                        return Err(format!(
                            "foreign key '{}' is not declared",
                            assoc.foreign_key
                        ))
                    }
                }
            }
        }

        for rule in &self.rules {
            let is_field = seen.contains(rule.field.as_str());
            let is_assoc = self
                .association_def(&rule.field)
                .map(|a| a.kind == AssociationKind::BelongsTo)
                .unwrap_or(false);

            match &rule.rule {
                RuleKind::Presence if is_field || is_assoc => {}
                _ if is_field => {}
                _ => {
                    return Err(format!(
                        "{} rule on undeclared field '{}'",
                        rule.rule.name(),
                        rule.field
                    ))
                }
            }

            if let RuleKind::Uniqueness { scope, .. } = &rule.rule {
                if let Some(missing) = scope.iter().find(|s| !seen.contains(s.as_str())) {
                    return Err(format!(
                        "uniqueness scope '{}' on '{}' is not declared",
                        missing, rule.field
                    ));
                }
            }
        }

        for callback in &self.callbacks {
            if !seen.contains(callback.field()) {
                return Err(format!(
                    "callback on undeclared field '{}'",
                    callback.field()
                ));
            }
        }

        Ok(())
    }
}
