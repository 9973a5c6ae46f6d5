use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::{
        postgres::{
            postgres_connection::PgPoolSquad,
            schema::{student_subscriptions, subscription_plans},
        },
        repositories::access_statuses,
    },
};
use domain::{
    entities::student_subscriptions::StudentSubscriptionEntity,
    repositories::student_subscriptions::StudentSubscriptionRepository,
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};

pub struct StudentSubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl StudentSubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl StudentSubscriptionRepository for StudentSubscriptionPostgres {
    async fn find_current_active(
        &self,
        student_id: Uuid,
    ) -> Result<Option<StudentSubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let subscription = student_subscriptions::table
            .filter(student_subscriptions::student_id.eq(student_id))
            .filter(student_subscriptions::status.eq_any(access_statuses()))
            .order_by(student_subscriptions::current_period_end.desc())
            .select(StudentSubscriptionEntity::as_select())
            .first::<StudentSubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(subscription)
    }

    async fn count_active_for_coach(&self, coach_id: Uuid) -> Result<i64> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let count = student_subscriptions::table
            .inner_join(subscription_plans::table)
            .filter(subscription_plans::coach_id.eq(coach_id))
            .filter(student_subscriptions::status.eq_any(access_statuses()))
            .filter(student_subscriptions::current_period_end.gt(Utc::now()))
            .count()
            .get_result::<i64>(&mut conn)?;

        Ok(count)
    }

    async fn list_expired_access_rows(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<StudentSubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = student_subscriptions::table
            .filter(student_subscriptions::status.eq_any(access_statuses()))
            .filter(student_subscriptions::current_period_end.lt(now))
            .select(StudentSubscriptionEntity::as_select())
            .load::<StudentSubscriptionEntity>(&mut conn)?;

        Ok(rows)
    }

    async fn transition_expired(
        &self,
        subscription_id: Uuid,
        to: SubscriptionStatus,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let canceled_at = match to {
            SubscriptionStatus::Canceled => Some(now),
            _ => None,
        };

        let updated = update(student_subscriptions::table)
            .filter(student_subscriptions::id.eq(subscription_id))
            .filter(student_subscriptions::status.eq_any(access_statuses()))
            .filter(student_subscriptions::current_period_end.lt(now))
            .set((
                student_subscriptions::status.eq(to.to_string()),
                student_subscriptions::canceled_at.eq(canceled_at),
            ))
            .execute(&mut conn)?;

        Ok(updated == 1)
    }
}
