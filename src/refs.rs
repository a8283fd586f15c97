//! Ref name matching
//!
//! A protected ref pattern is either an exact branch/tag name or a pattern
//! where `*` matches any run of characters (`release-*`, `*-stable`).

use regex::Regex;

/// Matches ref names against a protected-ref pattern
#[derive(Debug, Clone)]
pub struct RefMatcher {
    pattern: String,
    wildcard: Option<Regex>,
}

impl RefMatcher {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let wildcard = if pattern.contains('*') {
            let escaped: Vec<String> = pattern.split('*').map(regex::escape).collect();
            // An escaped pattern always compiles
            Regex::new(&format!("^{}$", escaped.join(".*?"))).ok()
        } else {
            None
        };
        Self { pattern, wildcard }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard.is_some()
    }

    pub fn matches(&self, ref_name: &str) -> bool {
        match &self.wildcard {
            Some(regex) => regex.is_match(ref_name),
            None => self.pattern == ref_name,
        }
    }

    /// The subset of `refs` this pattern matches, in input order
    pub fn matching<'a>(&self, refs: &[&'a str]) -> Vec<&'a str> {
        refs.iter().copied().filter(|r| self.matches(r)).collect()
    }
}
