use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::student_subscriptions::StudentSubscriptionEntity;
use crate::domain::value_objects::enums::subscription_statuses::SubscriptionStatus;

#[async_trait]
#[automock]
pub trait StudentSubscriptionRepository {
    async fn find_current_active(
        &self,
        student_id: Uuid,
    ) -> Result<Option<StudentSubscriptionEntity>>;

    /// Unexpired access-granting subscriptions across every plan the coach
    /// publishes; drives the commission tier.
    async fn count_active_for_coach(&self, coach_id: Uuid) -> Result<i64>;

    async fn list_expired_access_rows(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<StudentSubscriptionEntity>>;

    async fn transition_expired(
        &self,
        subscription_id: Uuid,
        to: SubscriptionStatus,
        now: DateTime<Utc>,
    ) -> Result<bool>;
}
