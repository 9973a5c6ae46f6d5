use chrono::{DateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::infra::db::postgres::schema::coach_profiles;

/// One row per coach, keyed by the auth subject id. The commission pair must
/// sum to 100; settlement validates that before splitting.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = coach_profiles)]
pub struct CoachProfileEntity {
    pub id: Uuid,
    pub max_students: i32,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub commission_rate: Decimal,
    pub platform_commission_rate: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
