use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use diesel::{RunQueryDsl, insert_into, prelude::*, update};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain,
    infra::db::{
        postgres::{
            postgres_connection::PgPoolSquad,
            schema::{payment_history, student_subscriptions},
        },
        repositories::access_statuses,
    },
};
use domain::{
    entities::student_subscriptions::{InsertStudentSubscriptionEntity, StudentSubscriptionEntity},
    repositories::settlements::{ApprovedSettlement, SettlementOutcome, SettlementRepository},
    value_objects::enums::{
        payment_statuses::PaymentStatus, subscription_statuses::SubscriptionStatus,
    },
};

pub struct SettlementPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SettlementPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SettlementRepository for SettlementPostgres {
    async fn apply_approved_settlement(
        &self,
        settlement: ApprovedSettlement,
    ) -> Result<SettlementOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<SettlementOutcome, diesel::result::Error, _>(|conn| {
            // The pending→approved update is the idempotency gate: a replayed
            // webhook finds no pending row and changes nothing.
            let approved_rows = update(payment_history::table)
                .filter(
                    payment_history::gateway_preference_id
                        .eq(&settlement.gateway_preference_id),
                )
                .filter(payment_history::status.eq(PaymentStatus::Pending.to_string()))
                .set((
                    payment_history::status.eq(PaymentStatus::Approved.to_string()),
                    payment_history::gateway_payment_id
                        .eq(Some(settlement.gateway_payment_id.clone())),
                    payment_history::coach_amount.eq(Some(settlement.split.coach_amount)),
                    payment_history::platform_amount.eq(Some(settlement.split.platform_amount)),
                    payment_history::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            if approved_rows == 0 {
                let already_settled = payment_history::table
                    .filter(
                        payment_history::gateway_payment_id
                            .eq(Some(settlement.gateway_payment_id.clone())),
                    )
                    .filter(payment_history::status.eq(PaymentStatus::Approved.to_string()))
                    .select(payment_history::id)
                    .first::<Uuid>(conn)
                    .optional()?;

                return Ok(match already_settled {
                    Some(_) => SettlementOutcome::AlreadyProcessed,
                    None => SettlementOutcome::MissingLedgerRow,
                });
            }

            let now = Utc::now();
            let current = student_subscriptions::table
                .filter(student_subscriptions::student_id.eq(settlement.student_id))
                .filter(student_subscriptions::plan_id.eq(settlement.plan_id))
                .filter(student_subscriptions::status.eq_any(access_statuses()))
                .order_by(student_subscriptions::current_period_end.desc())
                .select(StudentSubscriptionEntity::as_select())
                .first::<StudentSubscriptionEntity>(conn)
                .optional()?;

            match current {
                Some(subscription) => {
                    // Renewal extends from the later of the current period end
                    // and now, so early payments do not shorten the period.
                    let base = subscription.current_period_end.max(now);
                    update(student_subscriptions::table)
                        .filter(student_subscriptions::id.eq(subscription.id))
                        .set((
                            student_subscriptions::status
                                .eq(SubscriptionStatus::Active.to_string()),
                            student_subscriptions::current_period_end
                                .eq(base + Duration::days(settlement.period_days)),
                        ))
                        .execute(conn)?;

                    Ok(SettlementOutcome::Applied { renewed: true })
                }
                None => {
                    insert_into(student_subscriptions::table)
                        .values(&InsertStudentSubscriptionEntity {
                            student_id: settlement.student_id,
                            plan_id: settlement.plan_id,
                            status: SubscriptionStatus::Active.to_string(),
                            current_period_start: now,
                            current_period_end: now + Duration::days(settlement.period_days),
                            cancel_at_period_end: false,
                            canceled_at: None,
                        })
                        .execute(conn)?;

                    Ok(SettlementOutcome::Applied { renewed: false })
                }
            }
        })?;

        Ok(outcome)
    }
}
