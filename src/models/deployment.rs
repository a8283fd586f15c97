//! `deployment`: one rollout of a commit to an environment

use serde_json::json;

use super::pattern;
use crate::record::Record;
use crate::schema::{Association, FieldDef, FieldRule, RecordType, SchemaResult};

pub const STATUSES: &[&str] = &["created", "running", "success", "failed", "canceled", "skipped"];

const SHA_FORMAT: &str = r"^[0-9a-f]{7,40}$";
const SHORT_SHA_LEN: usize = 8;

pub fn descriptor() -> SchemaResult<RecordType> {
    Ok(RecordType::new("deployment")
        .field(FieldDef::int("iid"))
        .field(FieldDef::string("ref"))
        .field(FieldDef::string("sha"))
        .field(FieldDef::bool("tag").default_value(false))
        .field(FieldDef::string("status").default_value("created"))
        .field(FieldDef::timestamp("finished_at"))
        .belongs_to(Association::belongs_to("project", "project"))
        .belongs_to(Association::belongs_to("environment", "environment"))
        .belongs_to(Association::belongs_to("user", "user").optional())
        .validates(FieldRule::presence("ref"))
        .validates(FieldRule::presence("sha"))
        .validates(FieldRule::format("sha", pattern("deployment", SHA_FORMAT)?).allow_nil())
        .validates(FieldRule::uniqueness("iid").scoped_to(&["project_id"]))
        .validates(FieldRule::inclusion(
            "status",
            STATUSES.iter().map(|s| json!(s)).collect(),
        )))
}

/// First eight characters of the commit sha
pub fn short_sha(deployment: &Record) -> &str {
    let sha = deployment.get_str("sha").unwrap_or_default();
    sha.get(..SHORT_SHA_LEN).unwrap_or(sha)
}

pub fn is_success(deployment: &Record) -> bool {
    deployment.get_str("status") == Some("success")
}

pub fn is_finished(deployment: &Record) -> bool {
    matches!(
        deployment.get_str("status"),
        Some("success") | Some("failed") | Some("canceled")
    )
}

/// Delegates to the environment's `name`; `environment` is the resolved
/// `environment` association
pub fn environment_name<'a>(environment: Option<&'a Record>) -> Option<&'a str> {
    environment.and_then(|e| e.get_str("name"))
}
