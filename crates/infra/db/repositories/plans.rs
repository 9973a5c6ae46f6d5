use anyhow::Result;
use async_trait::async_trait;
use diesel::{RunQueryDsl, prelude::*};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{
        postgres_connection::PgPoolSquad,
        schema::{coach_plan_types, subscription_plans},
    },
};
use domain::{
    entities::plans::{CoachPlanEntity, CoachPlanRow, SubscriptionPlanEntity, SubscriptionPlanRow},
    repositories::plans::PlanCatalogRepository,
};

pub struct PlanCatalogPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PlanCatalogPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PlanCatalogRepository for PlanCatalogPostgres {
    async fn find_active_coach_plan(&self, plan_id: Uuid) -> Result<Option<CoachPlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = coach_plan_types::table
            .filter(coach_plan_types::id.eq(plan_id))
            .filter(coach_plan_types::is_active.eq(true))
            .select(CoachPlanRow::as_select())
            .first::<CoachPlanRow>(&mut conn)
            .optional()?;

        Ok(row.map(CoachPlanEntity::from))
    }

    async fn list_active_coach_plans(&self) -> Result<Vec<CoachPlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = coach_plan_types::table
            .filter(coach_plan_types::is_active.eq(true))
            .select(CoachPlanRow::as_select())
            .load::<CoachPlanRow>(&mut conn)?;

        Ok(rows.into_iter().map(CoachPlanEntity::from).collect())
    }

    async fn find_active_subscription_plan(
        &self,
        plan_id: Uuid,
    ) -> Result<Option<SubscriptionPlanEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = subscription_plans::table
            .filter(subscription_plans::id.eq(plan_id))
            .filter(subscription_plans::is_active.eq(true))
            .select(SubscriptionPlanRow::as_select())
            .first::<SubscriptionPlanRow>(&mut conn)
            .optional()?;

        Ok(row.map(SubscriptionPlanEntity::from))
    }
}
