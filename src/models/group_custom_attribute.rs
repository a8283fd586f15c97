//! `group_custom_attribute`: an admin-defined key/value pair on a group.
//! Keys are unique per group.

use crate::schema::{Association, FieldDef, FieldRule, RecordType};

pub fn descriptor() -> RecordType {
    RecordType::new("group_custom_attribute")
        .field(FieldDef::string("key"))
        .field(FieldDef::string("value"))
        .belongs_to(Association::belongs_to("group", "group"))
        .validates(FieldRule::presence("key"))
        .validates(FieldRule::presence("value"))
        .validates(FieldRule::uniqueness("key").scoped_to(&["group_id"]))
}
