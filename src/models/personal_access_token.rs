//! `personal_access_token`: a revocable API credential owned by a user
//!
//! The token is generated on first save with a `glpat-` prefix.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::record::Record;
use crate::repo::{RepoResult, Repository};
use crate::schema::{Association, Callback, FieldDef, FieldRule, FieldType, RecordType};
use crate::token::{constant_time_str_eq, digest_token};

pub const TOKEN_PREFIX: &str = "glpat-";

pub const AVAILABLE_SCOPES: &[&str] = &[
    "api",
    "read_api",
    "read_user",
    "read_repository",
    "write_repository",
];

pub fn descriptor() -> RecordType {
    RecordType::new("personal_access_token")
        .field(FieldDef::string("name"))
        .field(FieldDef::string("description"))
        .field(FieldDef::string("token"))
        .field(FieldDef::array("scopes", FieldType::String))
        .field(FieldDef::bool("revoked").default_value(false))
        .field(FieldDef::timestamp("expires_at"))
        .field(FieldDef::timestamp("last_used_at"))
        .belongs_to(Association::belongs_to("user", "user"))
        .belongs_to(
            Association::belongs_to("previous_personal_access_token", "personal_access_token")
                .optional(),
        )
        .validates(FieldRule::presence("name"))
        .validates(FieldRule::max_length("name", 255))
        .validates(FieldRule::presence("scopes"))
        .validates(FieldRule::uniqueness("token"))
        .callback(Callback::ensure_prefixed_token("token", TOKEN_PREFIX))
}

/// Not revoked and not past `expires_at` at `now`
pub fn is_active(token: &Record, now: DateTime<Utc>) -> bool {
    if token.get_bool("revoked").unwrap_or(false) {
        return false;
    }
    match token.get_str("expires_at").map(DateTime::parse_from_rfc3339) {
        Some(Ok(expires_at)) => expires_at.with_timezone(&Utc) > now,
        Some(Err(_)) => false,
        None => true,
    }
}

/// Compares `candidate` with the stored token in constant time
pub fn token_matches(token: &Record, candidate: &str) -> bool {
    match token.get_str("token") {
        Some(stored) => constant_time_str_eq(&digest_token(stored), &digest_token(candidate)),
        None => false,
    }
}

/// Scopes outside `AVAILABLE_SCOPES`
pub fn unknown_scopes(token: &Record) -> Vec<String> {
    token
        .get("scopes")
        .and_then(|v| v.as_array())
        .map(|scopes| {
            scopes
                .iter()
                .filter_map(|s| s.as_str())
                .filter(|s| !AVAILABLE_SCOPES.contains(s))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Marks `token` revoked and saves it
pub fn revoke(repo: &Repository, token: &mut Record) -> RepoResult<()> {
    repo.update(token, [("revoked", json!(true))])
}
