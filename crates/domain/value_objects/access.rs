use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::subscriptions::CoachSubscriptionModel;

/// Why access is currently denied. Deliberately coarse so the response never
/// leaks internal identifiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccessDenialReason {
    TrialExpired,
    NeverSubscribed,
}

impl Display for AccessDenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            AccessDenialReason::TrialExpired => "trial_expired",
            AccessDenialReason::NeverSubscribed => "never_subscribed",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AccessEvaluation {
    pub has_access: bool,
    pub is_trial: bool,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub trial_days_remaining: Option<i64>,
    pub denial_reason: Option<AccessDenialReason>,
    pub subscription: Option<CoachSubscriptionModel>,
}

impl AccessEvaluation {
    pub fn subscribed(subscription: CoachSubscriptionModel) -> Self {
        Self {
            has_access: true,
            is_trial: false,
            trial_ends_at: None,
            trial_days_remaining: None,
            denial_reason: None,
            subscription: Some(subscription),
        }
    }

    pub fn trial(trial_ends_at: DateTime<Utc>, days_remaining: i64) -> Self {
        Self {
            has_access: true,
            is_trial: true,
            trial_ends_at: Some(trial_ends_at),
            trial_days_remaining: Some(days_remaining),
            denial_reason: None,
            subscription: None,
        }
    }

    /// A denial with a known trial window means the trial lapsed; without one
    /// the coach never held any form of access.
    pub fn denied(trial_ends_at: Option<DateTime<Utc>>) -> Self {
        let denial_reason = match trial_ends_at {
            Some(_) => AccessDenialReason::TrialExpired,
            None => AccessDenialReason::NeverSubscribed,
        };

        Self {
            has_access: false,
            is_trial: false,
            trial_ends_at,
            trial_days_remaining: None,
            denial_reason: Some(denial_reason),
            subscription: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denial_reason_tracks_trial_presence() {
        let expired = AccessEvaluation::denied(Some(Utc::now()));
        assert_eq!(expired.denial_reason, Some(AccessDenialReason::TrialExpired));

        let never = AccessEvaluation::denied(None);
        assert_eq!(never.denial_reason, Some(AccessDenialReason::NeverSubscribed));
        assert!(!never.has_access);
    }
}
