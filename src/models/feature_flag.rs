//! `feature_flag`: a project-level toggle with rollout strategies

use super::pattern;
use crate::record::Record;
use crate::schema::{Association, FieldDef, FieldRule, RecordType, SchemaResult};

const NAME_FORMAT: &str = r"^[a-z]([-_a-z0-9]*[a-z0-9])?$";

pub fn descriptor() -> SchemaResult<RecordType> {
    Ok(RecordType::new("feature_flag")
        .field(FieldDef::string("name"))
        .field(FieldDef::text("description"))
        .field(FieldDef::bool("active").default_value(true))
        .field(FieldDef::int("iid"))
        .belongs_to(Association::belongs_to("project", "project"))
        .validates(FieldRule::presence("name"))
        .validates(FieldRule::max_length("name", 255))
        .validates(FieldRule::format("name", pattern("feature_flag", NAME_FORMAT)?))
        .validates(FieldRule::uniqueness("name").scoped_to(&["project_id"]).case_insensitive())
        .validates(FieldRule::uniqueness("iid").scoped_to(&["project_id"]))
        .has_many(
            Association::has_many("strategies", "feature_flag_strategy", "feature_flag_id")
                .dependent_destroy(),
        ))
}

pub fn is_active(flag: &Record) -> bool {
    flag.get_bool("active").unwrap_or(false)
}

/// On, with at least one rollout strategy
pub fn is_enabled(flag: &Record, strategies: &[Record]) -> bool {
    is_active(flag) && !strategies.is_empty()
}
