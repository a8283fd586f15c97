//! `project`: a repository with its issues, labels and deployment state

use super::{
    visibility_level, visibility_levels, VISIBILITY_INTERNAL, VISIBILITY_PRIVATE, VISIBILITY_PUBLIC,
};
use crate::record::Record;
use crate::schema::{Association, Callback, FieldDef, FieldRule, Normalizer, RecordType};

pub fn descriptor() -> RecordType {
    RecordType::new("project")
        .describe("A repository and everything attached to it")
        .field(FieldDef::string("name"))
        .field(FieldDef::string("path"))
        .field(FieldDef::text("description"))
        .field(FieldDef::int("visibility_level").default_value(VISIBILITY_PRIVATE))
        .field(FieldDef::bool("archived").default_value(false))
        .field(FieldDef::string("default_branch").default_value("main"))
        .field(FieldDef::string("runners_token"))
        .belongs_to(Association::belongs_to("group", "group"))
        .belongs_to(Association::belongs_to("creator", "user").optional())
        .validates(FieldRule::presence("name"))
        .validates(FieldRule::max_length("name", 255))
        .validates(FieldRule::presence("path"))
        .validates(FieldRule::max_length("path", 255))
        .validates(FieldRule::uniqueness("path").scoped_to(&["group_id"]).case_insensitive())
        .validates(FieldRule::inclusion("visibility_level", visibility_levels()))
        .validates(FieldRule::uniqueness("runners_token"))
        .callback(Callback::normalize("name", Normalizer::Strip))
        .callback(Callback::normalize("path", Normalizer::Strip))
        .callback(Callback::ensure_token("runners_token"))
        .has_one(
            Association::has_one("statistics", "project_statistics", "project_id")
                .dependent_destroy(),
        )
        .has_many(Association::has_many("issues", "issue", "project_id").dependent_destroy())
        .has_many(Association::has_many("labels", "label", "project_id").dependent_destroy())
        .has_many(Association::has_many("snippets", "snippet", "project_id").dependent_destroy())
        .has_many(
            Association::has_many("environments", "environment", "project_id").dependent_destroy(),
        )
        .has_many(
            Association::has_many("deployments", "deployment", "project_id").dependent_destroy(),
        )
        .has_many(
            Association::has_many("protected_branches", "protected_branch", "project_id")
                .dependent_destroy(),
        )
        .has_many(
            Association::has_many("feature_flags", "feature_flag", "project_id")
                .dependent_destroy(),
        )
}

pub fn is_public(project: &Record) -> bool {
    visibility_level(project) == VISIBILITY_PUBLIC
}

pub fn is_internal(project: &Record) -> bool {
    visibility_level(project) == VISIBILITY_INTERNAL
}

pub fn is_private(project: &Record) -> bool {
    visibility_level(project) == VISIBILITY_PRIVATE
}

pub fn is_archived(project: &Record) -> bool {
    project.get_bool("archived").unwrap_or(false)
}

/// `group/project`; `group` is the resolved `group` association
pub fn full_path(project: &Record, group: Option<&Record>) -> String {
    let path = project.get_str("path").unwrap_or_default();
    match group.and_then(|g| g.get_str("path")) {
        Some(namespace) => format!("{}/{}", namespace, path),
        None => path.to_string(),
    }
}
