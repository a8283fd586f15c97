//! `snippet`: a shareable piece of code, personal or attached to a project

use super::{project, visibility_level, visibility_levels, VISIBILITY_PRIVATE, VISIBILITY_PUBLIC};
use crate::record::Record;
use crate::schema::{Association, Callback, FieldDef, FieldRule, Normalizer, RecordType};

pub fn descriptor() -> RecordType {
    RecordType::new("snippet")
        .field(FieldDef::string("title"))
        .field(FieldDef::text("content"))
        .field(FieldDef::string("file_name"))
        .field(FieldDef::int("visibility_level").default_value(VISIBILITY_PRIVATE))
        .belongs_to(Association::belongs_to("author", "user"))
        .belongs_to(Association::belongs_to("project", "project").optional())
        .validates(FieldRule::presence("title"))
        .validates(FieldRule::max_length("title", 255))
        .validates(FieldRule::presence("content"))
        .validates(FieldRule::max_length("file_name", 255).allow_nil())
        .validates(FieldRule::inclusion("visibility_level", visibility_levels()))
        .callback(Callback::normalize("title", Normalizer::Strip))
        .has_many(
            Association::has_many("notes", "note", "noteable_id")
                .as_polymorphic("noteable")
                .dependent_destroy(),
        )
}

pub fn is_public(snippet: &Record) -> bool {
    visibility_level(snippet) == VISIBILITY_PUBLIC
}

/// Only public snippets, in public projects when attached to one, can be
/// embedded. `project` is the resolved `project` association.
pub fn is_embeddable(snippet: &Record, project: Option<&Record>) -> bool {
    is_public(snippet) && project.map(project::is_public).unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VISIBILITY_INTERNAL;

    fn snippet(level: i64) -> Record {
        Record::new("snippet").with("visibility_level", level)
    }

    #[test]
    fn test_personal_snippet_embeddable_when_public() {
        assert!(is_embeddable(&snippet(VISIBILITY_PUBLIC), None));
        assert!(!is_embeddable(&snippet(VISIBILITY_INTERNAL), None));
        assert!(!is_embeddable(&snippet(VISIBILITY_PRIVATE), None));
    }

    #[test]
    fn test_project_snippet_requires_public_project() {
        let public = Record::new("project").with("visibility_level", VISIBILITY_PUBLIC);
        let private = Record::new("project").with("visibility_level", VISIBILITY_PRIVATE);

        assert!(is_embeddable(&snippet(VISIBILITY_PUBLIC), Some(&public)));
        assert!(!is_embeddable(&snippet(VISIBILITY_PUBLIC), Some(&private)));
        assert!(!is_embeddable(&snippet(VISIBILITY_PRIVATE), Some(&public)));
    }

    #[test]
    fn test_associations() {
        let descriptor = descriptor();
        assert!(descriptor.association_def("author").unwrap().required);
        assert!(!descriptor.association_def("project").unwrap().required);
        assert!(descriptor.association_def("notes").unwrap().cascades());
    }
}
