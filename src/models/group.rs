//! `group`: a namespace owning projects, subgroups and custom attributes

use super::{visibility_level, visibility_levels, VISIBILITY_PUBLIC};
use crate::record::Record;
use crate::schema::{Association, Callback, FieldDef, FieldRule, Normalizer, RecordType};

pub fn descriptor() -> RecordType {
    RecordType::new("group")
        .describe("A namespace of projects")
        .field(FieldDef::string("name"))
        .field(FieldDef::string("path"))
        .field(FieldDef::text("description"))
        .field(FieldDef::int("visibility_level").default_value(0))
        .belongs_to(Association::belongs_to("parent", "group").optional())
        .validates(FieldRule::presence("name"))
        .validates(FieldRule::max_length("name", 255))
        .validates(FieldRule::presence("path"))
        .validates(FieldRule::max_length("path", 255))
        .validates(FieldRule::uniqueness("path").scoped_to(&["parent_id"]).case_insensitive())
        .validates(FieldRule::inclusion("visibility_level", visibility_levels()))
        .callback(Callback::normalize("path", Normalizer::Strip))
        .has_many(Association::has_many("subgroups", "group", "parent_id").dependent_destroy())
        .has_many(Association::has_many("projects", "project", "group_id").dependent_destroy())
        .has_many(
            Association::has_many("custom_attributes", "group_custom_attribute", "group_id")
                .dependent_destroy(),
        )
}

/// `parent/child` path; `parent` is the resolved `parent` association
pub fn full_path(group: &Record, parent: Option<&Record>) -> String {
    let path = group.get_str("path").unwrap_or_default();
    match parent.and_then(|p| p.get_str("path")) {
        Some(parent_path) => format!("{}/{}", parent_path, path),
        None => path.to_string(),
    }
}

pub fn is_public(group: &Record) -> bool {
    visibility_level(group) == VISIBILITY_PUBLIC
}
