//! Association declarations
//!
//! - `belongs_to`: the foreign key lives on the declaring record.
//! - `has_one` / `has_many`: the foreign key lives on the target record and
//!   points back at the declaring record's id.
//!
//! A polymorphic `belongs_to` stores a `<name>_type` tag next to its key; a
//! `has_*` declared `as` that association filters on the tag as well.

use serde::{Deserialize, Serialize};

/// Cardinality and key placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    BelongsTo,
    HasOne,
    HasMany,
}

/// What the association points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationTarget {
    /// A single record type
    Type(String),
    /// Any registered type, named by the `<name>_type` field
    Polymorphic,
}

/// What happens to associated records when the owner is destroyed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dependent {
    #[default]
    None,
    Destroy,
}

/// One declared association
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub name: String,
    pub kind: AssociationKind,
    pub target: AssociationTarget,
    pub foreign_key: String,
    /// For `has_*`: name of the polymorphic `belongs_to` on the target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_polymorphic: Option<String>,
    /// For `belongs_to`: the target must exist for the record to be valid
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub dependent: Dependent,
}

impl Association {
    /// Required `belongs_to` with key `<name>_id`
    pub fn belongs_to(name: impl Into<String>, target: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            foreign_key: format!("{}_id", name),
            name,
            kind: AssociationKind::BelongsTo,
            target: AssociationTarget::Type(target.into()),
            as_polymorphic: None,
            required: true,
            dependent: Dependent::None,
        }
    }

    /// Required polymorphic `belongs_to` with `<name>_id` and `<name>_type`
    pub fn polymorphic(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            foreign_key: format!("{}_id", name),
            name,
            kind: AssociationKind::BelongsTo,
            target: AssociationTarget::Polymorphic,
            as_polymorphic: None,
            required: true,
            dependent: Dependent::None,
        }
    }

    pub fn has_many(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: AssociationKind::HasMany,
            target: AssociationTarget::Type(target.into()),
            foreign_key: foreign_key.into(),
            as_polymorphic: None,
            required: false,
            dependent: Dependent::None,
        }
    }

    pub fn has_one(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            kind: AssociationKind::HasOne,
            ..Self::has_many(name, target, foreign_key)
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn foreign_key(mut self, foreign_key: impl Into<String>) -> Self {
        self.foreign_key = foreign_key.into();
        self
    }

    pub fn dependent_destroy(mut self) -> Self {
        self.dependent = Dependent::Destroy;
        self
    }

    /// Matches the target's polymorphic `belongs_to` named `name`
    pub fn as_polymorphic(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.foreign_key = format!("{}_id", name);
        self.as_polymorphic = Some(name);
        self
    }

    /// The concrete target type, if not polymorphic
    pub fn target_type(&self) -> Option<&str> {
        match &self.target {
            AssociationTarget::Type(name) => Some(name),
            AssociationTarget::Polymorphic => None,
        }
    }

    pub fn is_polymorphic(&self) -> bool {
        self.target == AssociationTarget::Polymorphic
    }

    pub fn is_collection(&self) -> bool {
        self.kind == AssociationKind::HasMany
    }

    pub fn cascades(&self) -> bool {
        self.dependent == Dependent::Destroy
    }

    /// The type-tag column this association reads or filters on, if any
    pub fn type_field(&self) -> Option<String> {
        match self.kind {
            AssociationKind::BelongsTo if self.is_polymorphic() => {
                Some(format!("{}_type", self.name))
            }
            AssociationKind::HasOne | AssociationKind::HasMany => {
                self.as_polymorphic.as_ref().map(|name| format!("{}_type", name))
            }
            AssociationKind::BelongsTo => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_belongs_to_defaults() {
        let assoc = Association::belongs_to("project", "project");
        assert_eq!(assoc.foreign_key, "project_id");
        assert!(assoc.required);
        assert_eq!(assoc.target_type(), Some("project"));
        assert!(assoc.type_field().is_none());
    }

    #[test]
    fn test_class_name_and_foreign_key_override() {
        let assoc = Association::belongs_to("creator", "user").foreign_key("creator_id");
        assert_eq!(assoc.name, "creator");
        assert_eq!(assoc.target_type(), Some("user"));
    }

    #[test]
    fn test_polymorphic_type_fields() {
        let owner = Association::polymorphic("noteable");
        assert!(owner.is_polymorphic());
        assert_eq!(owner.type_field().as_deref(), Some("noteable_type"));

        let notes = Association::has_many("notes", "note", "unused")
            .as_polymorphic("noteable")
            .dependent_destroy();
        assert_eq!(notes.foreign_key, "noteable_id");
        assert_eq!(notes.type_field().as_deref(), Some("noteable_type"));
        assert!(notes.cascades());
        assert!(notes.is_collection());
    }

    #[test]
    fn test_serde_shape() {
        let assoc = Association::has_one("statistics", "project_statistics", "project_id")
            .dependent_destroy();
        let json = serde_json::to_value(&assoc).unwrap();
        assert_eq!(json["kind"], "has_one");
        assert_eq!(json["target"], json!({"type": "project_statistics"}));
        assert_eq!(json["dependent"], "destroy");

        let poly = serde_json::to_value(Association::polymorphic("noteable")).unwrap();
        assert_eq!(poly["target"], "polymorphic");
    }
}
