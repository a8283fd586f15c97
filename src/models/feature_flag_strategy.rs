//! `feature_flag_strategy`: how a feature flag rolls out

use serde_json::json;

use crate::record::Record;
use crate::schema::{Association, FieldDef, FieldRule, NumericBounds, RecordType};

pub const STRATEGY_DEFAULT: &str = "default";
pub const STRATEGY_GRADUAL_ROLLOUT: &str = "gradualRolloutUserId";
pub const STRATEGY_FLEXIBLE_ROLLOUT: &str = "flexibleRollout";
pub const STRATEGY_USER_WITH_ID: &str = "userWithId";

pub fn descriptor() -> RecordType {
    RecordType::new("feature_flag_strategy")
        .field(FieldDef::string("name"))
        .field(FieldDef::float("percentage"))
        .field(FieldDef::string("user_ids"))
        .belongs_to(Association::belongs_to("feature_flag", "feature_flag"))
        .validates(FieldRule::presence("name"))
        .validates(FieldRule::inclusion(
            "name",
            vec![
                json!(STRATEGY_DEFAULT),
                json!(STRATEGY_GRADUAL_ROLLOUT),
                json!(STRATEGY_FLEXIBLE_ROLLOUT),
                json!(STRATEGY_USER_WITH_ID),
            ],
        ))
        .validates(
            FieldRule::numericality(
                "percentage",
                NumericBounds::new()
                    .greater_than_or_equal_to(0.0)
                    .less_than_or_equal_to(100.0),
            )
            .allow_nil(),
        )
}

/// Share of users the strategy reaches, as a fraction in `0.0..=1.0`
pub fn rollout_fraction(strategy: &Record) -> f64 {
    match strategy.get_str("name") {
        Some(STRATEGY_DEFAULT) => 1.0,
        Some(STRATEGY_GRADUAL_ROLLOUT) | Some(STRATEGY_FLEXIBLE_ROLLOUT) => {
            strategy.get_f64("percentage").unwrap_or(0.0) / 100.0
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordGateConfig;
    use crate::models;
    use crate::schema::ErrorKind;

    fn percentage_rejected(value: serde_json::Value) -> bool {
        let repo = models::repository(RecordGateConfig::default()).unwrap();
        let mut strategy = repo
            .build(
                "feature_flag_strategy",
                [("name", json!(STRATEGY_GRADUAL_ROLLOUT)), ("percentage", value)],
            )
            .unwrap();
        let errors = repo.validate(&mut strategy).unwrap();
        errors.has("percentage", ErrorKind::OutOfRange)
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(!percentage_rejected(json!(0)));
        assert!(!percentage_rejected(json!(100.0)));
        assert!(!percentage_rejected(json!(42.5)));
        assert!(percentage_rejected(json!(100.1)));
        assert!(percentage_rejected(json!(-0.1)));
    }

    #[test]
    fn test_unknown_strategy() {
        let repo = models::repository(RecordGateConfig::default()).unwrap();
        let mut strategy = repo
            .build("feature_flag_strategy", [("name", json!("random"))])
            .unwrap();
        let errors = repo.validate(&mut strategy).unwrap();
        assert!(errors.has("name", ErrorKind::NotInSet));
        assert!(errors.has("feature_flag", ErrorKind::MissingValue));
    }

    #[test]
    fn test_rollout_fraction() {
        let gradual = Record::new("feature_flag_strategy")
            .with("name", STRATEGY_GRADUAL_ROLLOUT)
            .with("percentage", 25.0);
        assert_eq!(rollout_fraction(&gradual), 0.25);
        assert_eq!(
            rollout_fraction(&Record::new("feature_flag_strategy").with("name", "default")),
            1.0
        );
    }
}
