use std::sync::Arc;

use chrono::Utc;
use crates::domain::{
    repositories::{
        coach_subscriptions::CoachSubscriptionRepository, plans::PlanCatalogRepository,
        student_subscriptions::StudentSubscriptionRepository,
    },
    value_objects::{
        enums::{feature_keys::FeatureKey, subscriber_roles::SubscriberRole},
        plans::PlanFeatures,
    },
};
use thiserror::Error;
use tracing::{debug, error};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EntitlementError {
    #[error("plan not found")]
    PlanNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl EntitlementError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            EntitlementError::PlanNotFound => StatusCode::NOT_FOUND,
            EntitlementError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Resolves the subscriber's currently active plan and answers capability
/// checks from its feature flags. Closed-world: no active plan, or an absent
/// flag, always answers false.
pub struct EntitlementUseCase<CS, SS, P>
where
    CS: CoachSubscriptionRepository + Send + Sync + 'static,
    SS: StudentSubscriptionRepository + Send + Sync + 'static,
    P: PlanCatalogRepository + Send + Sync + 'static,
{
    coach_subscription_repo: Arc<CS>,
    student_subscription_repo: Arc<SS>,
    plan_repo: Arc<P>,
}

impl<CS, SS, P> EntitlementUseCase<CS, SS, P>
where
    CS: CoachSubscriptionRepository + Send + Sync + 'static,
    SS: StudentSubscriptionRepository + Send + Sync + 'static,
    P: PlanCatalogRepository + Send + Sync + 'static,
{
    pub fn new(
        coach_subscription_repo: Arc<CS>,
        student_subscription_repo: Arc<SS>,
        plan_repo: Arc<P>,
    ) -> Self {
        Self {
            coach_subscription_repo,
            student_subscription_repo,
            plan_repo,
        }
    }

    pub async fn has_feature(
        &self,
        subscriber_id: Uuid,
        role: SubscriberRole,
        key: FeatureKey,
    ) -> Result<bool, EntitlementError> {
        let features = self.resolve_active_features(subscriber_id, role).await?;
        Ok(features.map(|features| features.allows(key)).unwrap_or(false))
    }

    /// Raw keys come straight from the route path; anything outside the
    /// closed enum resolves to false without touching the store.
    pub async fn has_feature_key(
        &self,
        subscriber_id: Uuid,
        role: SubscriberRole,
        raw_key: &str,
    ) -> Result<bool, EntitlementError> {
        match FeatureKey::from_str(raw_key) {
            Some(key) => self.has_feature(subscriber_id, role, key).await,
            None => {
                debug!(%subscriber_id, raw_key, "entitlements: unknown feature key");
                Ok(false)
            }
        }
    }

    pub async fn custom_quote_limit(
        &self,
        subscriber_id: Uuid,
        role: SubscriberRole,
    ) -> Result<i32, EntitlementError> {
        let features = self.resolve_active_features(subscriber_id, role).await?;
        Ok(features
            .map(|features| features.custom_quote_limit_or_default())
            .unwrap_or(0))
    }

    async fn resolve_active_features(
        &self,
        subscriber_id: Uuid,
        role: SubscriberRole,
    ) -> Result<Option<PlanFeatures>, EntitlementError> {
        let now = Utc::now();

        match role {
            SubscriberRole::Coach => {
                let Some(subscription) = self
                    .coach_subscription_repo
                    .find_current_active(subscriber_id)
                    .await
                    .map_err(|err| {
                        error!(
                            %subscriber_id,
                            db_error = ?err,
                            "entitlements: failed to load coach subscription"
                        );
                        EntitlementError::Internal(err)
                    })?
                else {
                    return Ok(None);
                };

                if subscription.current_period_end <= now {
                    return Ok(None);
                }

                let plan = self
                    .plan_repo
                    .find_active_coach_plan(subscription.plan_id)
                    .await
                    .map_err(|err| {
                        error!(
                            %subscriber_id,
                            plan_id = %subscription.plan_id,
                            db_error = ?err,
                            "entitlements: failed to load coach plan"
                        );
                        EntitlementError::Internal(err)
                    })?
                    .ok_or(EntitlementError::PlanNotFound)?;

                Ok(Some(plan.features))
            }
            SubscriberRole::Student => {
                let Some(subscription) = self
                    .student_subscription_repo
                    .find_current_active(subscriber_id)
                    .await
                    .map_err(|err| {
                        error!(
                            %subscriber_id,
                            db_error = ?err,
                            "entitlements: failed to load student subscription"
                        );
                        EntitlementError::Internal(err)
                    })?
                else {
                    return Ok(None);
                };

                if subscription.current_period_end <= now {
                    return Ok(None);
                }

                let plan = self
                    .plan_repo
                    .find_active_subscription_plan(subscription.plan_id)
                    .await
                    .map_err(|err| {
                        error!(
                            %subscriber_id,
                            plan_id = %subscription.plan_id,
                            db_error = ?err,
                            "entitlements: failed to load subscription plan"
                        );
                        EntitlementError::Internal(err)
                    })?
                    .ok_or(EntitlementError::PlanNotFound)?;

                Ok(Some(plan.features))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crates::domain::{
        entities::plans::SubscriptionPlanEntity,
        entities::student_subscriptions::StudentSubscriptionEntity,
        repositories::{
            coach_subscriptions::MockCoachSubscriptionRepository,
            plans::MockPlanCatalogRepository,
            student_subscriptions::MockStudentSubscriptionRepository,
        },
        value_objects::enums::subscription_statuses::SubscriptionStatus,
    };
    use mockall::predicate::eq;
    use rust_decimal::Decimal;

    fn sample_student_subscription(student_id: Uuid, plan_id: Uuid) -> StudentSubscriptionEntity {
        let now = Utc::now();
        StudentSubscriptionEntity {
            id: Uuid::new_v4(),
            student_id,
            plan_id,
            status: SubscriptionStatus::Active.to_string(),
            current_period_start: now - Duration::days(1),
            current_period_end: now + Duration::days(29),
            cancel_at_period_end: false,
            canceled_at: None,
            created_at: now,
        }
    }

    fn sample_plan(plan_id: Uuid, features: PlanFeatures) -> SubscriptionPlanEntity {
        SubscriptionPlanEntity {
            id: plan_id,
            coach_id: Uuid::new_v4(),
            name: "Hypertrophy Block".to_string(),
            price: Decimal::from(100),
            duration_days: 30,
            features,
            is_active: true,
        }
    }

    fn usecase(
        student_subscription_repo: MockStudentSubscriptionRepository,
        plan_repo: MockPlanCatalogRepository,
    ) -> EntitlementUseCase<
        MockCoachSubscriptionRepository,
        MockStudentSubscriptionRepository,
        MockPlanCatalogRepository,
    > {
        EntitlementUseCase::new(
            Arc::new(MockCoachSubscriptionRepository::new()),
            Arc::new(student_subscription_repo),
            Arc::new(plan_repo),
        )
    }

    #[tokio::test]
    async fn grants_a_flag_the_active_plan_enables() {
        let student_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();

        let mut student_subscription_repo = MockStudentSubscriptionRepository::new();
        let mut plan_repo = MockPlanCatalogRepository::new();

        let subscription = sample_student_subscription(student_id, plan_id);
        student_subscription_repo
            .expect_find_current_active()
            .with(eq(student_id))
            .returning(move |_| {
                let subscription = subscription.clone();
                Box::pin(async move { Ok(Some(subscription)) })
            });

        let plan = sample_plan(
            plan_id,
            PlanFeatures {
                score_logging: Some(true),
                ..Default::default()
            },
        );
        plan_repo
            .expect_find_active_subscription_plan()
            .with(eq(plan_id))
            .returning(move |_| {
                let plan = plan.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        let enabled = usecase(student_subscription_repo, plan_repo)
            .has_feature(student_id, SubscriberRole::Student, FeatureKey::ScoreLogging)
            .await
            .unwrap();

        assert!(enabled);
    }

    #[tokio::test]
    async fn absent_flags_default_to_false() {
        let student_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();

        let mut student_subscription_repo = MockStudentSubscriptionRepository::new();
        let mut plan_repo = MockPlanCatalogRepository::new();

        let subscription = sample_student_subscription(student_id, plan_id);
        student_subscription_repo
            .expect_find_current_active()
            .returning(move |_| {
                let subscription = subscription.clone();
                Box::pin(async move { Ok(Some(subscription)) })
            });

        let plan = sample_plan(plan_id, PlanFeatures::default());
        plan_repo
            .expect_find_active_subscription_plan()
            .returning(move |_| {
                let plan = plan.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        let enabled = usecase(student_subscription_repo, plan_repo)
            .has_feature(student_id, SubscriberRole::Student, FeatureKey::Leaderboard)
            .await
            .unwrap();

        assert!(!enabled);
    }

    #[tokio::test]
    async fn unknown_raw_keys_never_reach_the_store() {
        let student_id = Uuid::new_v4();

        // No expectations on either mock: a store call would panic the test.
        let enabled = usecase(
            MockStudentSubscriptionRepository::new(),
            MockPlanCatalogRepository::new(),
        )
        .has_feature_key(student_id, SubscriberRole::Student, "vip_lounge")
        .await
        .unwrap();

        assert!(!enabled);
    }

    #[tokio::test]
    async fn no_active_subscription_means_no_features() {
        let student_id = Uuid::new_v4();

        let mut student_subscription_repo = MockStudentSubscriptionRepository::new();
        student_subscription_repo
            .expect_find_current_active()
            .returning(|_| Box::pin(async { Ok(None) }));

        let enabled = usecase(student_subscription_repo, MockPlanCatalogRepository::new())
            .has_feature(student_id, SubscriberRole::Student, FeatureKey::Timer)
            .await
            .unwrap();

        assert!(!enabled);
    }

    #[tokio::test]
    async fn quote_limit_comes_from_the_plan() {
        let student_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();

        let mut student_subscription_repo = MockStudentSubscriptionRepository::new();
        let mut plan_repo = MockPlanCatalogRepository::new();

        let subscription = sample_student_subscription(student_id, plan_id);
        student_subscription_repo
            .expect_find_current_active()
            .returning(move |_| {
                let subscription = subscription.clone();
                Box::pin(async move { Ok(Some(subscription)) })
            });

        let plan = sample_plan(
            plan_id,
            PlanFeatures {
                custom_quote_limit: Some(25),
                ..Default::default()
            },
        );
        plan_repo
            .expect_find_active_subscription_plan()
            .returning(move |_| {
                let plan = plan.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        let limit = usecase(student_subscription_repo, plan_repo)
            .custom_quote_limit(student_id, SubscriberRole::Student)
            .await
            .unwrap();

        assert_eq!(limit, 25);
    }
}
