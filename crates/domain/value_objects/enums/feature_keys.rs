use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Closed set of capabilities a plan can grant. Anything outside this enum is
/// rejected at plan-authoring time, so an unknown key can never grant access.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKey {
    ScoreLogging,
    Leaderboard,
    Community,
    WhatsappSupport,
    Timer,
    PersonalizedWorkouts,
    CustomQuotes,
}

impl FeatureKey {
    pub const ALL: [FeatureKey; 7] = [
        FeatureKey::ScoreLogging,
        FeatureKey::Leaderboard,
        FeatureKey::Community,
        FeatureKey::WhatsappSupport,
        FeatureKey::Timer,
        FeatureKey::PersonalizedWorkouts,
        FeatureKey::CustomQuotes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKey::ScoreLogging => "score_logging",
            FeatureKey::Leaderboard => "leaderboard",
            FeatureKey::Community => "community",
            FeatureKey::WhatsappSupport => "whatsapp_support",
            FeatureKey::Timer => "timer",
            FeatureKey::PersonalizedWorkouts => "personalized_workouts",
            FeatureKey::CustomQuotes => "custom_quotes",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "score_logging" => Some(FeatureKey::ScoreLogging),
            "leaderboard" => Some(FeatureKey::Leaderboard),
            "community" => Some(FeatureKey::Community),
            "whatsapp_support" => Some(FeatureKey::WhatsappSupport),
            "timer" => Some(FeatureKey::Timer),
            "personalized_workouts" => Some(FeatureKey::PersonalizedWorkouts),
            "custom_quotes" => Some(FeatureKey::CustomQuotes),
            _ => None,
        }
    }
}

impl Display for FeatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
