use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::entities::coach_profiles::CoachProfileEntity;

#[async_trait]
#[automock]
pub trait CoachProfileRepository {
    async fn find_by_id(&self, coach_id: Uuid) -> Result<Option<CoachProfileEntity>>;

    /// Sets `trial_ends_at` only while it is NULL and returns whatever value
    /// ended up persisted — a losing concurrent writer gets the winner's
    /// window back instead of overwriting it.
    async fn assign_trial_if_unset(
        &self,
        coach_id: Uuid,
        trial_ends_at: DateTime<Utc>,
    ) -> Result<DateTime<Utc>>;

    async fn update_commission_rates(
        &self,
        coach_id: Uuid,
        coach_rate: Decimal,
        platform_rate: Decimal,
    ) -> Result<()>;

    async fn update_max_students(&self, coach_id: Uuid, max_students: i32) -> Result<()>;
}
