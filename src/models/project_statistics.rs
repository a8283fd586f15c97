//! `project_statistics`: storage counters, one row per project

use crate::record::Record;
use crate::schema::{Association, FieldDef, FieldRule, NumericBounds, RecordType};

const COUNTERS: &[&str] = &[
    "commit_count",
    "repository_size",
    "wiki_size",
    "lfs_objects_size",
    "build_artifacts_size",
];

pub fn descriptor() -> RecordType {
    let mut descriptor = RecordType::new("project_statistics")
        .belongs_to(Association::belongs_to("project", "project"))
        .validates(FieldRule::uniqueness("project_id"));

    for counter in COUNTERS {
        descriptor = descriptor
            .field(FieldDef::int(*counter).default_value(0))
            .validates(FieldRule::numericality(
                *counter,
                NumericBounds::new().only_integer().greater_than_or_equal_to(0.0),
            ));
    }
    descriptor
}

/// Sum of every stored artifact size, excluding the commit count
pub fn storage_size(statistics: &Record) -> i64 {
    COUNTERS
        .iter()
        .filter(|c| **c != "commit_count")
        .filter_map(|c| statistics.get_i64(c))
        .sum()
}
