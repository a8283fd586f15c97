//! `label`: a colored tag for issues within a project

use super::pattern;
use crate::record::Record;
use crate::schema::{
    Association, Callback, FieldDef, FieldRule, Normalizer, RecordType, SchemaResult,
};

pub const COLOR_FORMAT: &str = r"^#[0-9a-fA-F]{6}$";

const DARK_TEXT: &str = "#333333";
const LIGHT_TEXT: &str = "#FFFFFF";

pub fn descriptor() -> SchemaResult<RecordType> {
    Ok(RecordType::new("label")
        .field(FieldDef::string("title"))
        .field(FieldDef::string("color"))
        .field(FieldDef::string("description"))
        .belongs_to(Association::belongs_to("project", "project"))
        .validates(FieldRule::presence("title"))
        .validates(FieldRule::max_length("title", 255))
        .validates(FieldRule::uniqueness("title").scoped_to(&["project_id"]))
        .validates(FieldRule::presence("color"))
        .validates(FieldRule::format("color", pattern("label", COLOR_FORMAT)?))
        .callback(Callback::normalize("title", Normalizer::Strip))
        .callback(Callback::normalize("color", Normalizer::Strip)))
}

/// Text color readable on the label background.
///
/// Light backgrounds (channel sum above 500) get dark text. A color that
/// does not parse gets dark text too.
pub fn text_color(label: &Record) -> &'static str {
    let channels = label
        .get_str("color")
        .and_then(|c| c.strip_prefix('#'))
        .filter(|hex| hex.len() == 6)
        .and_then(|hex| {
            let channel = |i: usize| u32::from_str_radix(hex.get(i..i + 2)?, 16).ok();
            Some(channel(0)? + channel(2)? + channel(4)?)
        });

    match channels {
        Some(sum) if sum <= 500 => LIGHT_TEXT,
        _ => DARK_TEXT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordGateConfig;
    use crate::models;
    use crate::schema::ErrorKind;
    use serde_json::json;

    fn color_errors(color: &str) -> bool {
        let repo = models::repository(RecordGateConfig::default()).unwrap();
        let mut label = repo
            .build("label", [("title", json!("bug")), ("color", json!(color))])
            .unwrap();
        let errors = repo.validate(&mut label).unwrap();
        errors.has("color", ErrorKind::FormatMismatch)
    }

    #[test]
    fn test_color_format() {
        assert!(!color_errors("#000000"));
        assert!(!color_errors("#FFaa00"));
        assert!(color_errors("000000"));
        assert!(color_errors("#0z0000"));
        assert!(color_errors("#0000000"));
    }

    #[test]
    fn test_text_color() {
        assert_eq!(text_color(&Record::new("label").with("color", "#000000")), "#FFFFFF");
        assert_eq!(text_color(&Record::new("label").with("color", "#FFFFFF")), "#333333");
        assert_eq!(text_color(&Record::new("label").with("color", "#0z0000")), "#333333");
    }

    #[test]
    fn test_title_unique_per_project() {
        let descriptor = descriptor().unwrap();
        let constraint = &descriptor.unique_constraints()[0];
        assert_eq!(constraint.field, "title");
        assert_eq!(constraint.scope, vec!["project_id".to_string()]);
        assert!(constraint.case_sensitive);
    }
}
