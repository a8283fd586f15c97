//! `email`: a secondary address attached to a user

use super::{pattern, EMAIL_FORMAT};
use crate::record::Record;
use crate::schema::{
    Association, Callback, FieldDef, FieldRule, Normalizer, RecordType, SchemaResult,
};

pub fn descriptor() -> SchemaResult<RecordType> {
    Ok(RecordType::new("email")
        .field(FieldDef::string("email"))
        .field(FieldDef::timestamp("confirmed_at"))
        .belongs_to(Association::belongs_to("user", "user"))
        .validates(FieldRule::presence("email"))
        .validates(FieldRule::format("email", pattern("email", EMAIL_FORMAT)?))
        .validates(FieldRule::uniqueness("email").case_insensitive())
        .callback(Callback::normalize("email", Normalizer::Email)))
}

pub fn is_confirmed(email: &Record) -> bool {
    email.get_str("confirmed_at").is_some()
}
