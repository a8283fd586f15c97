//! `protected_branch`: a branch name or wildcard pattern guarded against
//! force pushes and unauthorized merges

use crate::record::Record;
use crate::refs::RefMatcher;
use crate::schema::{Association, Callback, FieldDef, FieldRule, Normalizer, RecordType};

pub fn descriptor() -> RecordType {
    RecordType::new("protected_branch")
        .field(FieldDef::string("name"))
        .field(FieldDef::bool("allow_force_push").default_value(false))
        .field(FieldDef::bool("code_owner_approval_required").default_value(false))
        .belongs_to(Association::belongs_to("project", "project"))
        .validates(FieldRule::presence("name"))
        .validates(FieldRule::max_length("name", 255))
        .validates(FieldRule::uniqueness("name").scoped_to(&["project_id"]))
        .callback(Callback::normalize("name", Normalizer::Strip))
}

fn matcher(branch: &Record) -> RefMatcher {
    RefMatcher::new(branch.get_str("name").unwrap_or_default())
}

/// Does this protection apply to `ref_name`?
pub fn matches(branch: &Record, ref_name: &str) -> bool {
    matcher(branch).matches(ref_name)
}

pub fn is_wildcard(branch: &Record) -> bool {
    matcher(branch).is_wildcard()
}

/// The subset of `refs` this protection applies to
pub fn matching<'a>(branch: &Record, refs: &[&'a str]) -> Vec<&'a str> {
    matcher(branch).matching(refs)
}

/// True if any of `branches` protects `ref_name`
pub fn protected_ref(branches: &[Record], ref_name: &str) -> bool {
    branches.iter().any(|b| matches(b, ref_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(name: &str) -> Record {
        Record::new("protected_branch").with("name", name)
    }

    #[test]
    fn test_exact_match() {
        let main = branch("main");
        assert!(matches(&main, "main"));
        assert!(!matches(&main, "main-2"));
        assert!(!is_wildcard(&main));
    }

    #[test]
    fn test_wildcard_delegation() {
        let stable = branch("*-stable");
        assert!(is_wildcard(&stable));
        assert_eq!(
            matching(&stable, &["13-0-stable", "main", "14-1-stable"]),
            vec!["13-0-stable", "14-1-stable"]
        );
    }

    #[test]
    fn test_protected_ref() {
        let branches = vec![branch("main"), branch("release/*")];
        assert!(protected_ref(&branches, "release/1.0"));
        assert!(protected_ref(&branches, "main"));
        assert!(!protected_ref(&branches, "feature"));
    }
}
