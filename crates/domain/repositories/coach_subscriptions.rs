use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::coach_subscriptions::{
    CoachSubscriptionEntity, InsertCoachSubscriptionEntity,
};
use crate::domain::value_objects::enums::subscription_statuses::SubscriptionStatus;

#[async_trait]
#[automock]
pub trait CoachSubscriptionRepository {
    /// Most recent access-granting row, ordered by `current_period_end`
    /// descending.
    async fn find_current_active(
        &self,
        coach_id: Uuid,
    ) -> Result<Option<CoachSubscriptionEntity>>;

    /// Cancels any access-granting row and inserts the replacement in one
    /// transaction, keeping at most one such row per coach.
    async fn supersede_active_and_insert(
        &self,
        insert: InsertCoachSubscriptionEntity,
    ) -> Result<Uuid>;

    /// Returns false when there was no access-granting row to flag.
    async fn schedule_cancel_at_period_end(&self, coach_id: Uuid) -> Result<bool>;

    async fn cancel_now(&self, coach_id: Uuid) -> Result<bool>;

    async fn list_expired_access_rows(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<CoachSubscriptionEntity>>;

    /// Conditional transition guarded on the row still being expired and
    /// access-granting; returns false when a concurrent sweep moved it first.
    async fn transition_expired(
        &self,
        subscription_id: Uuid,
        to: SubscriptionStatus,
        now: DateTime<Utc>,
    ) -> Result<bool>;
}
