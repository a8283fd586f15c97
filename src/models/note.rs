//! `note`: a comment on any noteable record (issue, snippet)

use crate::record::{Record, RecordRef};
use crate::schema::{Association, FieldDef, FieldRule, RecordType};

pub fn descriptor() -> RecordType {
    RecordType::new("note")
        .field(FieldDef::text("note"))
        .field(FieldDef::bool("system").default_value(false))
        .belongs_to(Association::polymorphic("noteable"))
        .belongs_to(Association::belongs_to("author", "user"))
        .belongs_to(Association::belongs_to("project", "project").optional())
        .validates(FieldRule::presence("note"))
        .validates(FieldRule::max_length("note", 1_000_000))
}

/// The commented record, as a (type, id) pair
pub fn noteable(note: &Record) -> Option<RecordRef> {
    let record_type = note.get_str("noteable_type")?;
    let id = note.get_id("noteable_id")?;
    Some(RecordRef::new(record_type, id))
}

pub fn for_issue(note: &Record) -> bool {
    note.get_str("noteable_type") == Some("issue")
}

pub fn for_snippet(note: &Record) -> bool {
    note.get_str("noteable_type") == Some("snippet")
}
