use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::infra::db::postgres::schema::payment_history;

/// Append-only settlement ledger. Rows only ever transition status; the
/// split amounts and the gateway payment id are stamped on approval.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = payment_history)]
pub struct PaymentHistoryEntity {
    pub id: Uuid,
    pub student_id: Uuid,
    pub plan_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub coach_amount: Option<Decimal>,
    pub platform_amount: Option<Decimal>,
    pub gateway_payment_id: Option<String>,
    pub gateway_preference_id: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = payment_history)]
pub struct InsertPaymentHistoryEntity {
    pub student_id: Uuid,
    pub plan_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub gateway_preference_id: String,
}
