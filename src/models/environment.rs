//! `environment`: a deployment target (production, staging, review apps)

use serde_json::json;

use crate::record::Record;
use crate::schema::{Association, Callback, FieldDef, FieldRule, Normalizer, RecordType};

pub const TIERS: &[&str] = &["production", "staging", "testing", "development", "other"];

pub fn descriptor() -> RecordType {
    RecordType::new("environment")
        .field(FieldDef::string("name"))
        .field(FieldDef::string("slug"))
        .field(FieldDef::string("external_url"))
        .field(FieldDef::string("state").default_value("available"))
        .field(FieldDef::string("tier"))
        .belongs_to(Association::belongs_to("project", "project"))
        .validates(FieldRule::presence("name"))
        .validates(FieldRule::uniqueness("name").scoped_to(&["project_id"]))
        .validates(FieldRule::max_length("name", 255))
        .validates(FieldRule::uniqueness("slug").scoped_to(&["project_id"]))
        .validates(FieldRule::max_length("slug", 24))
        .validates(FieldRule::max_length("external_url", 255).allow_nil())
        .validates(
            FieldRule::inclusion("tier", TIERS.iter().map(|t| json!(t)).collect()).allow_nil(),
        )
        .callback(Callback::normalize("name", Normalizer::Strip))
        .has_many(
            Association::has_many("deployments", "deployment", "environment_id")
                .dependent_destroy(),
        )
}

/// The most recent deployment among `deployments`: highest `iid`, then
/// highest id.
pub fn last_deployment(deployments: &[Record]) -> Option<&Record> {
    deployments
        .iter()
        .max_by_key(|d| (d.get_i64("iid").unwrap_or(0), d.id()))
}

/// Delegates to the last deployment's `sha`
pub fn last_deployment_sha(deployments: &[Record]) -> Option<&str> {
    last_deployment(deployments).and_then(|d| d.get_str("sha"))
}

/// `review` for `review/feature-1`; the name itself when unfoldered
pub fn folder_name(environment: &Record) -> &str {
    let name = environment.get_str("name").unwrap_or_default();
    name.split_once('/').map(|(folder, _)| folder).unwrap_or(name)
}

pub fn is_available(environment: &Record) -> bool {
    environment.get_str("state") == Some("available")
}
