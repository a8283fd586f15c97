//! Lifecycle callbacks
//!
//! Callbacks are declared, not coded: each is a small enum variant the
//! repository interprets at a fixed point of the lifecycle.
//!
//! - `Normalize` runs before every validation pass.
//! - `EnsureToken` runs after validation succeeds, before commit.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::Record;

/// String normalizations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalizer {
    /// Trim surrounding whitespace
    Strip,
    /// Lowercase
    Downcase,
    /// Trim, then lowercase
    Email,
}

impl Normalizer {
    pub fn apply(&self, value: &str) -> String {
        match self {
            Normalizer::Strip => value.trim().to_string(),
            Normalizer::Downcase => value.to_lowercase(),
            Normalizer::Email => value.trim().to_lowercase(),
        }
    }
}

/// A declared callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "callback", rename_all = "snake_case")]
pub enum Callback {
    Normalize {
        field: String,
        normalizer: Normalizer,
    },
    /// Fill a blank field with a fresh random token
    EnsureToken {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
    },
}

impl Callback {
    pub fn normalize(field: impl Into<String>, normalizer: Normalizer) -> Self {
        Callback::Normalize {
            field: field.into(),
            normalizer,
        }
    }

    pub fn ensure_token(field: impl Into<String>) -> Self {
        Callback::EnsureToken {
            field: field.into(),
            prefix: None,
        }
    }

    pub fn ensure_prefixed_token(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Callback::EnsureToken {
            field: field.into(),
            prefix: Some(prefix.into()),
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Callback::Normalize { field, .. } | Callback::EnsureToken { field, .. } => field,
        }
    }
}

/// Runs every `Normalize` callback on `record`. Non-string values are left alone.
pub fn run_normalizers(callbacks: &[Callback], record: &mut Record) {
    for callback in callbacks {
        if let Callback::Normalize { field, normalizer } = callback {
            let normalized = record.get_str(field).map(|s| normalizer.apply(s));
            if let Some(value) = normalized {
                record.set(field.clone(), Value::String(value));
            }
        }
    }
}

/// Runs every `EnsureToken` callback on `record`, generating tokens of
/// `token_bytes` random bytes for blank fields.
pub fn run_token_callbacks(callbacks: &[Callback], record: &mut Record, token_bytes: usize) {
    for callback in callbacks {
        if let Callback::EnsureToken { field, prefix } = callback {
            let blank = record.get_str(field).map(|s| s.trim().is_empty()).unwrap_or(true);
            if blank {
                let token = crate::token::generate_token(token_bytes);
                let value = match prefix {
                    Some(prefix) => format!("{}{}", prefix, token),
                    None => token,
                };
                record.set(field.clone(), Value::String(value));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalizer() {
        assert_eq!(Normalizer::Email.apply(" inFO@exAMPLe.com "), "info@example.com");
        assert_eq!(Normalizer::Strip.apply("  title "), "title");
        assert_eq!(Normalizer::Downcase.apply("MixedCase"), "mixedcase");
    }

    #[test]
    fn test_run_normalizers_is_idempotent() {
        let callbacks = vec![Callback::normalize("email", Normalizer::Email)];
        let mut record = Record::new("email").with("email", " A@B.io ");

        run_normalizers(&callbacks, &mut record);
        let once = record.clone();
        run_normalizers(&callbacks, &mut record);

        assert_eq!(record.get_str("email"), Some("a@b.io"));
        assert_eq!(record, once);
    }

    #[test]
    fn test_token_generated_only_when_blank() {
        let callbacks = vec![Callback::ensure_token("runners_token")];

        let mut blank = Record::new("project").with("runners_token", "");
        run_token_callbacks(&callbacks, &mut blank, 20);
        let generated = blank.get_str("runners_token").unwrap().to_string();
        assert!(!generated.is_empty());

        let mut provided = Record::new("project").with("runners_token", "my-token");
        run_token_callbacks(&callbacks, &mut provided, 20);
        assert_eq!(provided.get_str("runners_token"), Some("my-token"));
    }

    #[test]
    fn test_prefixed_token() {
        let callbacks = vec![Callback::ensure_prefixed_token("token", "glpat-")];
        let mut record = Record::new("personal_access_token");
        run_token_callbacks(&callbacks, &mut record, 20);
        assert!(record.get_str("token").unwrap().starts_with("glpat-"));
    }

    #[test]
    fn test_callback_serde_shape() {
        let json = serde_json::to_value(Callback::normalize("email", Normalizer::Email)).unwrap();
        assert_eq!(json["callback"], "normalize");
        assert_eq!(json["normalizer"], "email");
    }
}
