//! `issue`: a tracked unit of work within a project

use serde_json::json;

use crate::record::Record;
use crate::schema::{
    Association, Callback, FieldDef, FieldRule, Normalizer, NumericBounds, RecordType,
};

pub const STATE_OPENED: &str = "opened";
pub const STATE_CLOSED: &str = "closed";

pub fn descriptor() -> RecordType {
    RecordType::new("issue")
        .field(FieldDef::int("iid"))
        .field(FieldDef::string("title"))
        .field(FieldDef::text("description"))
        .field(FieldDef::string("state").default_value(STATE_OPENED))
        .field(FieldDef::bool("confidential").default_value(false))
        .field(FieldDef::timestamp("closed_at"))
        .belongs_to(Association::belongs_to("project", "project"))
        .belongs_to(Association::belongs_to("author", "user"))
        .validates(FieldRule::presence("title"))
        .validates(FieldRule::max_length("title", 255))
        .validates(FieldRule::inclusion(
            "state",
            vec![json!(STATE_OPENED), json!(STATE_CLOSED)],
        ))
        .validates(
            FieldRule::numericality("iid", NumericBounds::new().only_integer().greater_than(0.0))
                .allow_nil(),
        )
        .validates(FieldRule::uniqueness("iid").scoped_to(&["project_id"]))
        .callback(Callback::normalize("title", Normalizer::Strip))
        .has_many(
            Association::has_many("notes", "note", "noteable_id")
                .as_polymorphic("noteable")
                .dependent_destroy(),
        )
}

pub fn is_closed(issue: &Record) -> bool {
    issue.get_str("state") == Some(STATE_CLOSED)
}

pub fn is_confidential(issue: &Record) -> bool {
    issue.get_bool("confidential").unwrap_or(false)
}

/// `#iid`, the project-local reference
pub fn to_reference(issue: &Record) -> String {
    match issue.get_i64("iid") {
        Some(iid) => format!("#{}", iid),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordGateConfig;
    use crate::models;
    use crate::schema::ErrorKind;

    #[test]
    fn test_notes_are_polymorphic() {
        let descriptor = descriptor();
        let notes = descriptor.association_def("notes").unwrap();
        assert_eq!(notes.as_polymorphic.as_deref(), Some("noteable"));
        assert_eq!(notes.type_field().as_deref(), Some("noteable_type"));
        assert!(notes.cascades());
    }

    #[test]
    fn test_state_inclusion() {
        let repo = models::repository(RecordGateConfig::default()).unwrap();
        let mut issue = repo
            .build("issue", [("title", json!("Bug")), ("state", json!("reopened"))])
            .unwrap();
        let errors = repo.validate(&mut issue).unwrap();
        assert!(errors.has("state", ErrorKind::NotInSet));
        assert!(errors.has("project", ErrorKind::MissingValue));
        assert!(errors.has("author", ErrorKind::MissingValue));
    }

    #[test]
    fn test_accessors() {
        let issue = Record::new("issue")
            .with("iid", 42)
            .with("state", STATE_CLOSED);
        assert!(is_closed(&issue));
        assert!(!is_confidential(&issue));
        assert_eq!(to_reference(&issue), "#42");
        assert_eq!(to_reference(&Record::new("issue")), "");
    }
}
