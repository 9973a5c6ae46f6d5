use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::postgres::{postgres_connection::PgPoolSquad, schema::payment_history},
};
use domain::{
    entities::payment_history::{InsertPaymentHistoryEntity, PaymentHistoryEntity},
    repositories::payment_history::PaymentHistoryRepository,
    value_objects::enums::payment_statuses::PaymentStatus,
};

pub struct PaymentHistoryPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl PaymentHistoryPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentHistoryRepository for PaymentHistoryPostgres {
    async fn append(&self, row: InsertPaymentHistoryEntity) -> Result<Uuid> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let payment_id = insert_into(payment_history::table)
            .values(&row)
            .returning(payment_history::id)
            .get_result::<Uuid>(&mut conn)?;

        Ok(payment_id)
    }

    async fn find_by_gateway_payment_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<PaymentHistoryEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let row = payment_history::table
            .filter(payment_history::gateway_payment_id.eq(gateway_payment_id))
            .select(PaymentHistoryEntity::as_select())
            .first::<PaymentHistoryEntity>(&mut conn)
            .optional()?;

        Ok(row)
    }

    async fn mark_status_by_preference_id(
        &self,
        gateway_preference_id: &str,
        gateway_payment_id: &str,
        status: PaymentStatus,
    ) -> Result<bool> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let updated = update(payment_history::table)
            .filter(payment_history::gateway_preference_id.eq(gateway_preference_id))
            .filter(payment_history::status.eq(PaymentStatus::Pending.to_string()))
            .set((
                payment_history::status.eq(status.to_string()),
                payment_history::gateway_payment_id.eq(Some(gateway_payment_id.to_string())),
                payment_history::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)?;

        Ok(updated > 0)
    }
}
