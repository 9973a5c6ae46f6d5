use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::{
        postgres::{postgres_connection::PgPoolSquad, schema::coach_subscriptions},
        repositories::access_statuses,
    },
};
use domain::{
    entities::coach_subscriptions::{CoachSubscriptionEntity, InsertCoachSubscriptionEntity},
    repositories::coach_subscriptions::CoachSubscriptionRepository,
    value_objects::enums::subscription_statuses::SubscriptionStatus,
};

pub struct CoachSubscriptionPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CoachSubscriptionPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CoachSubscriptionRepository for CoachSubscriptionPostgres {
    async fn find_current_active(
        &self,
        coach_id: Uuid,
    ) -> Result<Option<CoachSubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let subscription = coach_subscriptions::table
            .filter(coach_subscriptions::coach_id.eq(coach_id))
            .filter(coach_subscriptions::status.eq_any(access_statuses()))
            .order_by(coach_subscriptions::current_period_end.desc())
            .select(CoachSubscriptionEntity::as_select())
            .first::<CoachSubscriptionEntity>(&mut conn)
            .optional()?;

        Ok(subscription)
    }

    async fn supersede_active_and_insert(
        &self,
        insert: InsertCoachSubscriptionEntity,
    ) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let subscription_id = conn.transaction::<Uuid, diesel::result::Error, _>(|conn| {
            update(coach_subscriptions::table)
                .filter(coach_subscriptions::coach_id.eq(insert.coach_id))
                .filter(coach_subscriptions::status.eq_any(access_statuses()))
                .set((
                    coach_subscriptions::status.eq(SubscriptionStatus::Canceled.to_string()),
                    coach_subscriptions::cancel_at_period_end.eq(false),
                    coach_subscriptions::canceled_at.eq(Some(Utc::now())),
                ))
                .execute(conn)?;

            insert_into(coach_subscriptions::table)
                .values(&insert)
                .returning(coach_subscriptions::id)
                .get_result::<Uuid>(conn)
        })?;

        Ok(subscription_id)
    }

    async fn schedule_cancel_at_period_end(&self, coach_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(coach_subscriptions::table)
            .filter(coach_subscriptions::coach_id.eq(coach_id))
            .filter(coach_subscriptions::status.eq_any(access_statuses()))
            .set(coach_subscriptions::cancel_at_period_end.eq(true))
            .execute(&mut conn)?;

        Ok(updated > 0)
    }

    async fn cancel_now(&self, coach_id: Uuid) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(coach_subscriptions::table)
            .filter(coach_subscriptions::coach_id.eq(coach_id))
            .filter(coach_subscriptions::status.eq_any(access_statuses()))
            .set((
                coach_subscriptions::status.eq(SubscriptionStatus::Canceled.to_string()),
                coach_subscriptions::cancel_at_period_end.eq(false),
                coach_subscriptions::canceled_at.eq(Some(Utc::now())),
            ))
            .execute(&mut conn)?;

        Ok(updated > 0)
    }

    async fn list_expired_access_rows(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<CoachSubscriptionEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let rows = coach_subscriptions::table
            .filter(coach_subscriptions::status.eq_any(access_statuses()))
            .filter(coach_subscriptions::current_period_end.lt(now))
            .select(CoachSubscriptionEntity::as_select())
            .load::<CoachSubscriptionEntity>(&mut conn)?;

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

        // Re-checking status and expiry here keeps a concurrent sweep from
        // double-transitioning the same row.
        let updated = update(coach_subscriptions::table)
            .filter(coach_subscriptions::id.eq(subscription_id))
            .filter(coach_subscriptions::status.eq_any(access_statuses()))
            .filter(coach_subscriptions::current_period_end.lt(now))
            .set((
                coach_subscriptions::status.eq(to.to_string()),
                coach_subscriptions::canceled_at.eq(canceled_at),
            ))
            .execute(&mut conn)?;

        Ok(updated == 1)
    }
}
