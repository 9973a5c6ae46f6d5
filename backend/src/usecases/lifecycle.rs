use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use crates::domain::{
    entities::coach_subscriptions::InsertCoachSubscriptionEntity,
    repositories::{
        coach_profiles::CoachProfileRepository,
        coach_subscriptions::CoachSubscriptionRepository, plans::PlanCatalogRepository,
        student_subscriptions::StudentSubscriptionRepository,
    },
    value_objects::{
        enums::subscription_statuses::SubscriptionStatus,
        revenue_splits::{RatePair, rate_pair_for_student_count},
        subscriptions::{CoachPlanDto, CurrentSubscriptionDto},
    },
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("plan not found")]
    PlanNotFound,
    #[error("no active subscription")]
    SubscriptionNotFound,
    #[error("coach profile not found")]
    CoachNotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LifecycleError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            LifecycleError::PlanNotFound
            | LifecycleError::SubscriptionNotFound
            | LifecycleError::CoachNotFound => StatusCode::NOT_FOUND,
            LifecycleError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Aggregate counts for one table's sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepCounts {
    pub scanned: usize,
    pub canceled: usize,
    pub past_due: usize,
    pub already_transitioned: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepResult {
    pub coach: SweepCounts,
    pub student: SweepCounts,
}

#[derive(Debug, Clone, Copy)]
pub struct CommissionRefresh {
    pub student_count: i64,
    pub rates: RatePair,
}

pub struct LifecycleUseCase<CS, SS, CP, PL>
where
    CS: CoachSubscriptionRepository + Send + Sync + 'static,
    SS: StudentSubscriptionRepository + Send + Sync + 'static,
    CP: CoachProfileRepository + Send + Sync + 'static,
    PL: PlanCatalogRepository + Send + Sync + 'static,
{
    coach_subscription_repo: Arc<CS>,
    student_subscription_repo: Arc<SS>,
    profile_repo: Arc<CP>,
    plan_repo: Arc<PL>,
}

impl<CS, SS, CP, PL> LifecycleUseCase<CS, SS, CP, PL>
where
    CS: CoachSubscriptionRepository + Send + Sync + 'static,
    SS: StudentSubscriptionRepository + Send + Sync + 'static,
    CP: CoachProfileRepository + Send + Sync + 'static,
    PL: PlanCatalogRepository + Send + Sync + 'static,
{
    pub fn new(
        coach_subscription_repo: Arc<CS>,
        student_subscription_repo: Arc<SS>,
        profile_repo: Arc<CP>,
        plan_repo: Arc<PL>,
    ) -> Self {
        Self {
            coach_subscription_repo,
            student_subscription_repo,
            profile_repo,
            plan_repo,
        }
    }

    /// Expiry sweep over both subscription tables, driven by an external cron
    /// trigger. `cancel_at_period_end` rows become canceled, the rest go
    /// past_due awaiting renewal.
    pub async fn sweep(&self) -> Result<SweepResult, LifecycleError> {
        let now = Utc::now();

        let coach = self.sweep_coach_rows(now).await?;
        let student = self.sweep_student_rows(now).await?;

        info!(
            coach_scanned = coach.scanned,
            coach_canceled = coach.canceled,
            coach_past_due = coach.past_due,
            coach_failed = coach.failed,
            student_scanned = student.scanned,
            student_canceled = student.canceled,
            student_past_due = student.past_due,
            student_failed = student.failed,
            "lifecycle: sweep completed"
        );

        Ok(SweepResult { coach, student })
    }

    async fn sweep_coach_rows(&self, now: DateTime<Utc>) -> Result<SweepCounts, LifecycleError> {
        let rows = self
            .coach_subscription_repo
            .list_expired_access_rows(now)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "lifecycle: failed to list expired coach rows");
                LifecycleError::Internal(err)
            })?;

        let mut counts = SweepCounts {
            scanned: rows.len(),
            ..Default::default()
        };

        for row in rows {
            let target = if row.cancel_at_period_end {
                SubscriptionStatus::Canceled
            } else {
                SubscriptionStatus::PastDue
            };

            match self
                .coach_subscription_repo
                .transition_expired(row.id, target, now)
                .await
            {
                Ok(true) => match target {
                    SubscriptionStatus::Canceled => counts.canceled += 1,
                    _ => counts.past_due += 1,
                },
                // A concurrent sweep moved the row first; nothing to do.
                Ok(false) => counts.already_transitioned += 1,
                Err(err) => {
                    // One bad row must not abort the rest of the sweep.
                    error!(
                        subscription_id = %row.id,
                        error = ?err,
                        "lifecycle: coach sweep transition failed"
                    );
                    counts.failed += 1;
                }
            }
        }

        Ok(counts)
    }

    async fn sweep_student_rows(&self, now: DateTime<Utc>) -> Result<SweepCounts, LifecycleError> {
        let rows = self
            .student_subscription_repo
            .list_expired_access_rows(now)
            .await
            .map_err(|err| {
                error!(db_error = ?err, "lifecycle: failed to list expired student rows");
                LifecycleError::Internal(err)
            })?;

        let mut counts = SweepCounts {
            scanned: rows.len(),
            ..Default::default()
        };

        for row in rows {
            let target = if row.cancel_at_period_end {
                SubscriptionStatus::Canceled
            } else {
                SubscriptionStatus::PastDue
            };

            match self
                .student_subscription_repo
                .transition_expired(row.id, target, now)
                .await
            {
                Ok(true) => match target {
                    SubscriptionStatus::Canceled => counts.canceled += 1,
                    _ => counts.past_due += 1,
                },
                Ok(false) => counts.already_transitioned += 1,
                Err(err) => {
                    error!(
                        subscription_id = %row.id,
                        error = ?err,
                        "lifecycle: student sweep transition failed"
                    );
                    counts.failed += 1;
                }
            }
        }

        Ok(counts)
    }

    /// Supersedes the current subscription with the chosen plan and syncs the
    /// profile's commission pair and roster limit from it. Prior rows are
    /// canceled, never deleted.
    pub async fn change_plan(
        &self,
        coach_id: Uuid,
        plan_id: Uuid,
        start_as_trial: bool,
    ) -> Result<Uuid, LifecycleError> {
        let plan = self
            .plan_repo
            .find_active_coach_plan(plan_id)
            .await
            .map_err(|err| {
                error!(%coach_id, %plan_id, db_error = ?err, "lifecycle: failed to load plan");
                LifecycleError::Internal(err)
            })?
            .ok_or(LifecycleError::PlanNotFound)?;

        let now = Utc::now();
        let status = if start_as_trial {
            SubscriptionStatus::Trial
        } else {
            SubscriptionStatus::Active
        };

        let subscription_id = self
            .coach_subscription_repo
            .supersede_active_and_insert(InsertCoachSubscriptionEntity {
                coach_id,
                plan_id,
                status: status.to_string(),
                current_period_start: now,
                current_period_end: now + Duration::days(plan.duration_days.into()),
                cancel_at_period_end: false,
                canceled_at: None,
            })
            .await
            .map_err(|err| {
                error!(%coach_id, %plan_id, db_error = ?err, "lifecycle: failed to supersede subscription");
                LifecycleError::Internal(err)
            })?;

        let platform_rate = Decimal::ONE_HUNDRED - plan.commission_rate;
        self.profile_repo
            .update_commission_rates(coach_id, plan.commission_rate, platform_rate)
            .await
            .map_err(|err| {
                error!(%coach_id, db_error = ?err, "lifecycle: failed to sync commission rates");
                LifecycleError::Internal(err)
            })?;

        self.profile_repo
            .update_max_students(coach_id, plan.max_students)
            .await
            .map_err(|err| {
                error!(%coach_id, db_error = ?err, "lifecycle: failed to sync max students");
                LifecycleError::Internal(err)
            })?;

        info!(
            %coach_id,
            %plan_id,
            %subscription_id,
            status = %status,
            "lifecycle: plan change applied"
        );

        Ok(subscription_id)
    }

    pub async fn cancel_at_period_end(&self, coach_id: Uuid) -> Result<(), LifecycleError> {
        let updated = self
            .coach_subscription_repo
            .schedule_cancel_at_period_end(coach_id)
            .await
            .map_err(|err| {
                error!(%coach_id, db_error = ?err, "lifecycle: failed to schedule cancel");
                LifecycleError::Internal(err)
            })?;

        if !updated {
            return Err(LifecycleError::SubscriptionNotFound);
        }

        info!(%coach_id, "lifecycle: cancel scheduled for period end");
        Ok(())
    }

    pub async fn cancel_now(&self, coach_id: Uuid) -> Result<(), LifecycleError> {
        let updated = self
            .coach_subscription_repo
            .cancel_now(coach_id)
            .await
            .map_err(|err| {
                error!(%coach_id, db_error = ?err, "lifecycle: failed to cancel subscription");
                LifecycleError::Internal(err)
            })?;

        if !updated {
            return Err(LifecycleError::SubscriptionNotFound);
        }

        info!(%coach_id, "lifecycle: subscription canceled immediately");
        Ok(())
    }

    /// Re-derives the commission pair from the coach's current roster size.
    pub async fn refresh_commission_rates(
        &self,
        coach_id: Uuid,
    ) -> Result<CommissionRefresh, LifecycleError> {
        self.profile_repo
            .find_by_id(coach_id)
            .await
            .map_err(|err| {
                error!(%coach_id, db_error = ?err, "lifecycle: failed to load coach profile");
                LifecycleError::Internal(err)
            })?
            .ok_or(LifecycleError::CoachNotFound)?;

        let student_count = self
            .student_subscription_repo
            .count_active_for_coach(coach_id)
            .await
            .map_err(|err| {
                error!(%coach_id, db_error = ?err, "lifecycle: failed to count students");
                LifecycleError::Internal(err)
            })?;

        let rates = rate_pair_for_student_count(student_count);
        self.profile_repo
            .update_commission_rates(coach_id, rates.coach_rate, rates.platform_rate)
            .await
            .map_err(|err| {
                error!(%coach_id, db_error = ?err, "lifecycle: failed to persist refreshed rates");
                LifecycleError::Internal(err)
            })?;

        info!(
            %coach_id,
            student_count,
            coach_rate = %rates.coach_rate,
            platform_rate = %rates.platform_rate,
            "lifecycle: commission rates refreshed"
        );

        Ok(CommissionRefresh {
            student_count,
            rates,
        })
    }

    pub async fn list_plans(&self) -> Result<Vec<CoachPlanDto>, LifecycleError> {
        let plans = self.plan_repo.list_active_coach_plans().await.map_err(|err| {
            error!(db_error = ?err, "lifecycle: failed to list active plans");
            LifecycleError::Internal(err)
        })?;

        Ok(plans.into_iter().map(CoachPlanDto::from).collect())
    }

    pub async fn current_subscription(
        &self,
        coach_id: Uuid,
    ) -> Result<CurrentSubscriptionDto, LifecycleError> {
        let subscription = self
            .coach_subscription_repo
            .find_current_active(coach_id)
            .await
            .map_err(|err| {
                error!(%coach_id, db_error = ?err, "lifecycle: failed to load current subscription");
                LifecycleError::Internal(err)
            })?
            .ok_or(LifecycleError::SubscriptionNotFound)?;

        let plan = self
            .plan_repo
            .find_active_coach_plan(subscription.plan_id)
            .await
            .map_err(|err| {
                error!(
                    %coach_id,
                    plan_id = %subscription.plan_id,
                    db_error = ?err,
                    "lifecycle: failed to load plan for current subscription"
                );
                LifecycleError::Internal(err)
            })?
            .ok_or(LifecycleError::PlanNotFound)?;

        Ok(CurrentSubscriptionDto {
            plan_id: plan.id,
            plan_name: plan.name,
            status: SubscriptionStatus::from_str(&subscription.status)
                .unwrap_or(SubscriptionStatus::Canceled),
            current_period_start: subscription.current_period_start,
            current_period_end: subscription.current_period_end,
            cancel_at_period_end: subscription.cancel_at_period_end,
            features: plan.features,
        })
    }
}
