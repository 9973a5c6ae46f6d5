use serde::{Deserialize, Serialize};

use crate::domain::value_objects::enums::feature_keys::FeatureKey;

/// Limits and feature flags attached to a plan. Stored as JSONB in the
/// database. Unknown fields fail deserialization, so a malformed flag map
/// degrades to the all-false default instead of granting anything.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PlanFeatures {
    #[serde(default)]
    pub score_logging: Option<bool>,

    #[serde(default)]
    pub leaderboard: Option<bool>,

    #[serde(default)]
    pub community: Option<bool>,

    #[serde(default)]
    pub whatsapp_support: Option<bool>,

    #[serde(default)]
    pub timer: Option<bool>,

    #[serde(default)]
    pub personalized_workouts: Option<bool>,

    #[serde(default)]
    pub custom_quotes: Option<bool>,

    #[serde(default)]
    pub custom_quote_limit: Option<i32>,
}

impl PlanFeatures {
    /// Absence of a flag never implies access.
    pub fn allows(&self, key: FeatureKey) -> bool {
        match key {
            FeatureKey::ScoreLogging => self.score_logging.unwrap_or(false),
            FeatureKey::Leaderboard => self.leaderboard.unwrap_or(false),
            FeatureKey::Community => self.community.unwrap_or(false),
            FeatureKey::WhatsappSupport => self.whatsapp_support.unwrap_or(false),
            FeatureKey::Timer => self.timer.unwrap_or(false),
            FeatureKey::PersonalizedWorkouts => self.personalized_workouts.unwrap_or(false),
            FeatureKey::CustomQuotes => self.custom_quotes.unwrap_or(false),
        }
    }

    /// Count-limited independently of the `custom_quotes` boolean gate.
    pub fn custom_quote_limit_or_default(&self) -> i32 {
        self.custom_quote_limit.unwrap_or(0)
    }

    pub fn from_db_value(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_every_flag_to_false() {
        let features = PlanFeatures::default();
        for key in FeatureKey::ALL {
            assert!(!features.allows(key));
        }
        assert_eq!(features.custom_quote_limit_or_default(), 0);
    }

    #[test]
    fn reads_flags_from_plan_json() {
        let features = PlanFeatures::from_db_value(json!({
            "score_logging": true,
            "leaderboard": true,
            "custom_quote_limit": 5
        }));

        assert!(features.allows(FeatureKey::ScoreLogging));
        assert!(features.allows(FeatureKey::Leaderboard));
        assert!(!features.allows(FeatureKey::Community));
        assert_eq!(features.custom_quote_limit_or_default(), 5);
    }

    #[test]
    fn malformed_flag_maps_degrade_to_no_access() {
        let features = PlanFeatures::from_db_value(json!({
            "score_logging": true,
            "vip_lounge": true
        }));

        assert_eq!(features, PlanFeatures::default());
        assert!(!features.allows(FeatureKey::ScoreLogging));
    }
}
