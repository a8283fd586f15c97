//! Field rules
//!
//! A field may carry several rules; all must pass. Rules are data, not code:
//! they serialize to the same JSON the descriptor loader reads back.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A compiled regular expression that serializes as its source string
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Result<Self, regex::Error> {
        let source = source.into();
        let regex = Regex::new(&source)?;
        Ok(Self { source, regex })
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl TryFrom<String> for Pattern {
    type Error = regex::Error;

    fn try_from(source: String) -> Result<Self, Self::Error> {
        Pattern::new(source)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.source
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.source)
    }
}

/// Comparators for a numeric rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericBounds {
    #[serde(default)]
    pub only_integer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greater_than: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greater_than_or_equal_to: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub less_than: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub less_than_or_equal_to: Option<f64>,
}

impl NumericBounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn only_integer(mut self) -> Self {
        self.only_integer = true;
        self
    }

    pub fn greater_than(mut self, bound: f64) -> Self {
        self.greater_than = Some(bound);
        self
    }

    pub fn greater_than_or_equal_to(mut self, bound: f64) -> Self {
        self.greater_than_or_equal_to = Some(bound);
        self
    }

    pub fn less_than(mut self, bound: f64) -> Self {
        self.less_than = Some(bound);
        self
    }

    pub fn less_than_or_equal_to(mut self, bound: f64) -> Self {
        self.less_than_or_equal_to = Some(bound);
        self
    }

    /// Checks a parsed number; returns the violation message on failure.
    pub fn check(&self, number: f64) -> Result<(), String> {
        if self.only_integer && number.fract() != 0.0 {
            return Err("must be an integer".into());
        }
        if let Some(bound) = self.greater_than {
            if number <= bound {
                return Err(format!("must be greater than {}", bound));
            }
        }
        if let Some(bound) = self.greater_than_or_equal_to {
            if number < bound {
                return Err(format!("must be greater than or equal to {}", bound));
            }
        }
        if let Some(bound) = self.less_than {
            if number >= bound {
                return Err(format!("must be less than {}", bound));
            }
        }
        if let Some(bound) = self.less_than_or_equal_to {
            if number > bound {
                return Err(format!("must be less than or equal to {}", bound));
            }
        }
        Ok(())
    }
}

/// What a rule checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleKind {
    /// Non-blank value, or a resolvable association target
    Presence,
    /// Character count bounds
    Length {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
    },
    /// Number (or numeric string) within bounds
    Numericality(NumericBounds),
    /// Member of a fixed set; `null` may be listed
    Inclusion { allowed: Vec<Value> },
    /// String matching a pattern
    Format { pattern: Pattern },
    /// No other persisted record shares the value within `scope`
    Uniqueness {
        #[serde(default)]
        scope: Vec<String>,
        #[serde(default = "default_case_sensitive")]
        case_sensitive: bool,
    },
}

fn default_case_sensitive() -> bool {
    true
}

impl RuleKind {
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Presence => "presence",
            RuleKind::Length { .. } => "length",
            RuleKind::Numericality(_) => "numericality",
            RuleKind::Inclusion { .. } => "inclusion",
            RuleKind::Format { .. } => "format",
            RuleKind::Uniqueness { .. } => "uniqueness",
        }
    }
}

/// A rule bound to one field (or association name, for presence)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    pub field: String,
    #[serde(flatten)]
    pub rule: RuleKind,
    /// Skip the rule when the value is absent or null
    #[serde(default)]
    pub allow_nil: bool,
}

impl FieldRule {
    pub fn new(field: impl Into<String>, rule: RuleKind) -> Self {
        Self {
            field: field.into(),
            rule,
            allow_nil: false,
        }
    }

    pub fn presence(field: impl Into<String>) -> Self {
        Self::new(field, RuleKind::Presence)
    }

    pub fn length(field: impl Into<String>, min: Option<usize>, max: Option<usize>) -> Self {
        Self::new(field, RuleKind::Length { min, max })
    }

    pub fn max_length(field: impl Into<String>, max: usize) -> Self {
        Self::length(field, None, Some(max))
    }

    pub fn numericality(field: impl Into<String>, bounds: NumericBounds) -> Self {
        Self::new(field, RuleKind::Numericality(bounds))
    }

    pub fn inclusion(field: impl Into<String>, allowed: Vec<Value>) -> Self {
        Self::new(field, RuleKind::Inclusion { allowed })
    }

    pub fn format(field: impl Into<String>, pattern: Pattern) -> Self {
        Self::new(field, RuleKind::Format { pattern })
    }

    /// Case-sensitive, unscoped uniqueness
    pub fn uniqueness(field: impl Into<String>) -> Self {
        Self::new(
            field,
            RuleKind::Uniqueness {
                scope: Vec::new(),
                case_sensitive: true,
            },
        )
    }

    /// Sets the uniqueness scope; no effect on other rule kinds
    pub fn scoped_to(mut self, fields: &[&str]) -> Self {
        if let RuleKind::Uniqueness { scope, .. } = &mut self.rule {
            *scope = fields.iter().map(|f| f.to_string()).collect();
        }
        self
    }

    /// Makes a uniqueness rule compare case-insensitively
    pub fn case_insensitive(mut self) -> Self {
        if let RuleKind::Uniqueness { case_sensitive, .. } = &mut self.rule {
            *case_sensitive = false;
        }
        self
    }

    pub fn allow_nil(mut self) -> Self {
        self.allow_nil = true;
        self
    }
}
