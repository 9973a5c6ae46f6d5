use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::plans::{CoachPlanEntity, SubscriptionPlanEntity};

#[async_trait]
#[automock]
pub trait PlanCatalogRepository {
    async fn find_active_coach_plan(&self, plan_id: Uuid) -> Result<Option<CoachPlanEntity>>;

    async fn list_active_coach_plans(&self) -> Result<Vec<CoachPlanEntity>>;

    async fn find_active_subscription_plan(
        &self,
        plan_id: Uuid,
    ) -> Result<Option<SubscriptionPlanEntity>>;
}
