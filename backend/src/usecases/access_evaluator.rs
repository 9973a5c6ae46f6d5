use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use crates::domain::{
    repositories::{
        coach_profiles::CoachProfileRepository,
        coach_subscriptions::CoachSubscriptionRepository,
    },
    value_objects::access::AccessEvaluation,
};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

/// Free trial window granted to coaches that never had one.
pub const TRIAL_PERIOD_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("coach profile not found")]
    CoachNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AccessError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            AccessError::CoachNotFound => StatusCode::NOT_FOUND,
            AccessError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub struct AccessEvaluatorUseCase<P, S>
where
    P: CoachProfileRepository + Send + Sync + 'static,
    S: CoachSubscriptionRepository + Send + Sync + 'static,
{
    profile_repo: Arc<P>,
    subscription_repo: Arc<S>,
}

impl<P, S> AccessEvaluatorUseCase<P, S>
where
    P: CoachProfileRepository + Send + Sync + 'static,
    S: CoachSubscriptionRepository + Send + Sync + 'static,
{
    pub fn new(profile_repo: Arc<P>, subscription_repo: Arc<S>) -> Self {
        Self {
            profile_repo,
            subscription_repo,
        }
    }

    pub async fn evaluate_access(&self, coach_id: Uuid) -> Result<AccessEvaluation, AccessError> {
        let profile = self
            .profile_repo
            .find_by_id(coach_id)
            .await
            .map_err(|err| {
                error!(%coach_id, db_error = ?err, "access: failed to load coach profile");
                AccessError::Internal(err)
            })?
            .ok_or(AccessError::CoachNotFound)?;

        let now = Utc::now();

        // A paid subscription always wins over the trial window, even an
        // expired one.
        if let Some(subscription) = self
            .subscription_repo
            .find_current_active(coach_id)
            .await
            .map_err(|err| {
                error!(%coach_id, db_error = ?err, "access: failed to load current subscription");
                AccessError::Internal(err)
            })?
        {
            if subscription.current_period_end > now {
                info!(
                    %coach_id,
                    subscription_id = %subscription.id,
                    "access: granted by active subscription"
                );
                return Ok(AccessEvaluation::subscribed(subscription.into()));
            }
        }

        let trial_ends_at = match profile.trial_ends_at {
            Some(trial_ends_at) => trial_ends_at,
            // Legacy coach without a trial window. The conditional write keeps
            // two concurrent evaluations from granting different windows; a
            // loser receives the winner's value.
            None => {
                let assigned = self
                    .profile_repo
                    .assign_trial_if_unset(coach_id, now + Duration::days(TRIAL_PERIOD_DAYS))
                    .await
                    .map_err(|err| {
                        error!(%coach_id, db_error = ?err, "access: failed to assign trial window");
                        AccessError::Internal(err)
                    })?;
                info!(%coach_id, trial_ends_at = %assigned, "access: trial window assigned");
                assigned
            }
        };

        // Calendar-date comparison so a trial ending later today still counts,
        // regardless of the hour-of-day drift between server and coach locale.
        if trial_ends_at.date_naive() >= now.date_naive() {
            let days_remaining = trial_days_remaining(trial_ends_at, now);
            info!(%coach_id, days_remaining, "access: granted by trial");
            Ok(AccessEvaluation::trial(trial_ends_at, days_remaining))
        } else {
            info!(%coach_id, "access: denied");
            Ok(AccessEvaluation::denied(Some(trial_ends_at)))
        }
    }
}

fn trial_days_remaining(trial_ends_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (trial_ends_at - now).num_seconds();
    if seconds <= 0 {
        0
    } else {
        // Ceiling division: any started day counts as remaining.
        (seconds + 86_399) / 86_400
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crates::domain::{
        entities::coach_subscriptions::CoachSubscriptionEntity,
        entities::coach_profiles::CoachProfileEntity,
        repositories::{
            coach_profiles::MockCoachProfileRepository,
            coach_subscriptions::MockCoachSubscriptionRepository,
        },
        value_objects::{
            access::AccessDenialReason,
            enums::subscription_statuses::SubscriptionStatus,
        },
    };
    use mockall::predicate::eq;
    use rust_decimal::Decimal;

    fn sample_profile(coach_id: Uuid, trial_ends_at: Option<DateTime<Utc>>) -> CoachProfileEntity {
        let now = Utc::now();
        CoachProfileEntity {
            id: coach_id,
            max_students: 10,
            trial_ends_at,
            commission_rate: Decimal::from(88),
            platform_commission_rate: Decimal::from(12),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_subscription(coach_id: Uuid, ends_at: DateTime<Utc>) -> CoachSubscriptionEntity {
        let now = Utc::now();
        CoachSubscriptionEntity {
            id: Uuid::new_v4(),
            coach_id,
            plan_id: Uuid::new_v4(),
            status: SubscriptionStatus::Active.to_string(),
            current_period_start: ends_at - Duration::days(30),
            current_period_end: ends_at,
            cancel_at_period_end: false,
            canceled_at: None,
            created_at: now,
        }
    }

    fn usecase(
        profile_repo: MockCoachProfileRepository,
        subscription_repo: MockCoachSubscriptionRepository,
    ) -> AccessEvaluatorUseCase<MockCoachProfileRepository, MockCoachSubscriptionRepository> {
        AccessEvaluatorUseCase::new(Arc::new(profile_repo), Arc::new(subscription_repo))
    }

    #[tokio::test]
    async fn active_subscription_wins_over_expired_trial() {
        let coach_id = Uuid::new_v4();
        let expired_trial = Utc::now() - Duration::days(30);

        let mut profile_repo = MockCoachProfileRepository::new();
        let mut subscription_repo = MockCoachSubscriptionRepository::new();

        let profile = sample_profile(coach_id, Some(expired_trial));
        profile_repo
            .expect_find_by_id()
            .with(eq(coach_id))
            .returning(move |_| {
                let profile = profile.clone();
                Box::pin(async move { Ok(Some(profile)) })
            });

        let subscription = sample_subscription(coach_id, Utc::now() + Duration::days(12));
        subscription_repo
            .expect_find_current_active()
            .with(eq(coach_id))
            .returning(move |_| {
                let subscription = subscription.clone();
                Box::pin(async move { Ok(Some(subscription)) })
            });

        let evaluation = usecase(profile_repo, subscription_repo)
            .evaluate_access(coach_id)
            .await
            .unwrap();

        assert!(evaluation.has_access);
        assert!(!evaluation.is_trial);
        assert!(evaluation.subscription.is_some());
    }

    #[tokio::test]
    async fn trial_ending_today_still_grants_access() {
        let coach_id = Uuid::new_v4();

        let mut profile_repo = MockCoachProfileRepository::new();
        let mut subscription_repo = MockCoachSubscriptionRepository::new();

        let profile = sample_profile(coach_id, Some(Utc::now()));
        profile_repo.expect_find_by_id().returning(move |_| {
            let profile = profile.clone();
            Box::pin(async move { Ok(Some(profile)) })
        });
        subscription_repo
            .expect_find_current_active()
            .returning(|_| Box::pin(async { Ok(None) }));

        let evaluation = usecase(profile_repo, subscription_repo)
            .evaluate_access(coach_id)
            .await
            .unwrap();

        assert!(evaluation.has_access);
        assert!(evaluation.is_trial);
        assert_eq!(evaluation.trial_days_remaining, Some(0));
    }

    #[tokio::test]
    async fn expired_trial_denies_access() {
        let coach_id = Uuid::new_v4();
        let yesterday = Utc::now() - Duration::days(1);

        let mut profile_repo = MockCoachProfileRepository::new();
        let mut subscription_repo = MockCoachSubscriptionRepository::new();

        let profile = sample_profile(coach_id, Some(yesterday));
        profile_repo.expect_find_by_id().returning(move |_| {
            let profile = profile.clone();
            Box::pin(async move { Ok(Some(profile)) })
        });
        subscription_repo
            .expect_find_current_active()
            .returning(|_| Box::pin(async { Ok(None) }));

        let evaluation = usecase(profile_repo, subscription_repo)
            .evaluate_access(coach_id)
            .await
            .unwrap();

        assert!(!evaluation.has_access);
        assert_eq!(
            evaluation.denial_reason,
            Some(AccessDenialReason::TrialExpired)
        );
        assert_eq!(evaluation.trial_ends_at, Some(yesterday));
    }

    #[tokio::test]
    async fn expired_subscription_falls_back_to_a_valid_trial() {
        let coach_id = Uuid::new_v4();
        let trial_ends_at = Utc::now() + Duration::days(3);

        let mut profile_repo = MockCoachProfileRepository::new();
        let mut subscription_repo = MockCoachSubscriptionRepository::new();

        let profile = sample_profile(coach_id, Some(trial_ends_at));
        profile_repo.expect_find_by_id().returning(move |_| {
            let profile = profile.clone();
            Box::pin(async move { Ok(Some(profile)) })
        });

        let stale = sample_subscription(coach_id, Utc::now() - Duration::days(2));
        subscription_repo
            .expect_find_current_active()
            .returning(move |_| {
                let stale = stale.clone();
                Box::pin(async move { Ok(Some(stale)) })
            });

        let evaluation = usecase(profile_repo, subscription_repo)
            .evaluate_access(coach_id)
            .await
            .unwrap();

        assert!(evaluation.has_access);
        assert!(evaluation.is_trial);
        assert_eq!(evaluation.trial_days_remaining, Some(3));
    }

    #[tokio::test]
    async fn legacy_coach_gets_a_seven_day_trial_assigned() {
        let coach_id = Uuid::new_v4();

        let mut profile_repo = MockCoachProfileRepository::new();
        let mut subscription_repo = MockCoachSubscriptionRepository::new();

        let profile = sample_profile(coach_id, None);
        profile_repo.expect_find_by_id().returning(move |_| {
            let profile = profile.clone();
            Box::pin(async move { Ok(Some(profile)) })
        });
        subscription_repo
            .expect_find_current_active()
            .returning(|_| Box::pin(async { Ok(None) }));

        profile_repo
            .expect_assign_trial_if_unset()
            .times(1)
            .returning(|_, requested| Box::pin(async move { Ok(requested) }));

        let evaluation = usecase(profile_repo, subscription_repo)
            .evaluate_access(coach_id)
            .await
            .unwrap();

        assert!(evaluation.has_access);
        assert!(evaluation.is_trial);
        assert_eq!(evaluation.trial_days_remaining, Some(TRIAL_PERIOD_DAYS));
    }

    #[tokio::test]
    async fn losing_writer_uses_the_winners_trial_window() {
        let coach_id = Uuid::new_v4();
        let winner_window = Utc::now() + Duration::days(2);

        let mut profile_repo = MockCoachProfileRepository::new();
        let mut subscription_repo = MockCoachSubscriptionRepository::new();

        let profile = sample_profile(coach_id, None);
        profile_repo.expect_find_by_id().returning(move |_| {
            let profile = profile.clone();
            Box::pin(async move { Ok(Some(profile)) })
        });
        subscription_repo
            .expect_find_current_active()
            .returning(|_| Box::pin(async { Ok(None) }));

        // The conditional write lost the race and handed back the value the
        // winner persisted.
        profile_repo
            .expect_assign_trial_if_unset()
            .returning(move |_, _| Box::pin(async move { Ok(winner_window) }));

        let evaluation = usecase(profile_repo, subscription_repo)
            .evaluate_access(coach_id)
            .await
            .unwrap();

        assert!(evaluation.has_access);
        assert_eq!(evaluation.trial_ends_at, Some(winner_window));
        assert_eq!(evaluation.trial_days_remaining, Some(2));
    }

    #[tokio::test]
    async fn missing_profile_is_not_found() {
        let coach_id = Uuid::new_v4();

        let mut profile_repo = MockCoachProfileRepository::new();
        let subscription_repo = MockCoachSubscriptionRepository::new();

        profile_repo
            .expect_find_by_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let result = usecase(profile_repo, subscription_repo)
            .evaluate_access(coach_id)
            .await;

        assert!(matches!(result, Err(AccessError::CoachNotFound)));
    }

    #[test]
    fn days_remaining_is_a_ceiling_floored_at_zero() {
        let now = Utc::now();
        assert_eq!(trial_days_remaining(now, now), 0);
        assert_eq!(trial_days_remaining(now - Duration::hours(5), now), 0);
        assert_eq!(trial_days_remaining(now + Duration::hours(1), now), 1);
        assert_eq!(trial_days_remaining(now + Duration::days(7), now), 7);
        assert_eq!(
            trial_days_remaining(now + Duration::days(6) + Duration::hours(1), now),
            7
        );
    }
}
