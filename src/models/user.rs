//! `user`: an account that authors issues, notes and snippets

use serde_json::json;

use super::{pattern, EMAIL_FORMAT};
use crate::record::Record;
use crate::schema::{
    Association, Callback, FieldDef, FieldRule, Normalizer, RecordType, SchemaResult,
};

pub const STATE_ACTIVE: &str = "active";
pub const STATE_BLOCKED: &str = "blocked";

pub fn descriptor() -> SchemaResult<RecordType> {
    Ok(RecordType::new("user")
        .describe("An account")
        .field(FieldDef::string("name"))
        .field(FieldDef::string("username"))
        .field(FieldDef::string("email"))
        .field(FieldDef::string("state").default_value(STATE_ACTIVE))
        .field(FieldDef::bool("admin").default_value(false))
        .field(FieldDef::string("authentication_token"))
        .validates(FieldRule::presence("name"))
        .validates(FieldRule::max_length("name", 255))
        .validates(FieldRule::presence("username"))
        .validates(FieldRule::max_length("username", 255))
        .validates(FieldRule::uniqueness("username").case_insensitive())
        .validates(FieldRule::presence("email"))
        .validates(FieldRule::format("email", pattern("user", EMAIL_FORMAT)?))
        .validates(FieldRule::uniqueness("email").case_insensitive())
        .validates(FieldRule::inclusion(
            "state",
            vec![json!(STATE_ACTIVE), json!(STATE_BLOCKED)],
        ))
        .validates(FieldRule::uniqueness("authentication_token"))
        .callback(Callback::normalize("username", Normalizer::Strip))
        .callback(Callback::normalize("email", Normalizer::Email))
        .callback(Callback::ensure_token("authentication_token"))
        .has_many(Association::has_many("emails", "email", "user_id").dependent_destroy())
        .has_many(
            Association::has_many("personal_access_tokens", "personal_access_token", "user_id")
                .dependent_destroy(),
        )
        .has_many(Association::has_many("snippets", "snippet", "author_id").dependent_destroy())
        .has_many(Association::has_many("issues", "issue", "author_id"))
        .has_many(Association::has_many("notes", "note", "author_id")))
}

/// `@username`, the form used to mention a user
pub fn to_reference(user: &Record) -> String {
    format!("@{}", user.get_str("username").unwrap_or_default())
}

pub fn is_admin(user: &Record) -> bool {
    user.get_bool("admin").unwrap_or(false)
}

pub fn is_blocked(user: &Record) -> bool {
    user.get_str("state") == Some(STATE_BLOCKED)
}
