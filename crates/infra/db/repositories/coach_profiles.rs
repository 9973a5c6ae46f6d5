use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{RunQueryDsl, prelude::*, update};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::coach_profiles},
};
use domain::{
    entities::coach_profiles::CoachProfileEntity,
    repositories::coach_profiles::CoachProfileRepository,
};

pub struct CoachProfilePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl CoachProfilePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CoachProfileRepository for CoachProfilePostgres {
    async fn find_by_id(&self, coach_id: Uuid) -> Result<Option<CoachProfileEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let profile = coach_profiles::table
            .filter(coach_profiles::id.eq(coach_id))
            .select(CoachProfileEntity::as_select())
            .first::<CoachProfileEntity>(&mut conn)
            .optional()?;

        Ok(profile)
    }

    async fn assign_trial_if_unset(
        &self,
        coach_id: Uuid,
        trial_ends_at: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        // Only the first writer lands; losers read the winner's window back.
        update(coach_profiles::table)
            .filter(coach_profiles::id.eq(coach_id))
            .filter(coach_profiles::trial_ends_at.is_null())
            .set((
                coach_profiles::trial_ends_at.eq(Some(trial_ends_at)),
                coach_profiles::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        let persisted = coach_profiles::table
            .filter(coach_profiles::id.eq(coach_id))
            .select(coach_profiles::trial_ends_at)
            .first::<Option<DateTime<Utc>>>(&mut conn)?;

        persisted.ok_or_else(|| {
            anyhow!("trial_ends_at still unset after conditional assignment for coach {coach_id}")
        })
    }

    async fn update_commission_rates(
        &self,
        coach_id: Uuid,
        coach_rate: Decimal,
        platform_rate: Decimal,
    ) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(coach_profiles::table)
            .filter(coach_profiles::id.eq(coach_id))
            .set((
                coach_profiles::commission_rate.eq(coach_rate),
                coach_profiles::platform_commission_rate.eq(platform_rate),
                coach_profiles::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn update_max_students(&self, coach_id: Uuid, max_students: i32) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(coach_profiles::table)
            .filter(coach_profiles::id.eq(coach_id))
            .set((
                coach_profiles::max_students.eq(max_students),
                coach_profiles::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}
