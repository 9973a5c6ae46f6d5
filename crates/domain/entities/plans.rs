use diesel::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::value_objects::plans::PlanFeatures;
use crate::infra::db::postgres::schema::{coach_plan_types, subscription_plans};

/// Catalog entry a coach subscribes to for platform access.
#[derive(Debug, Clone)]
pub struct CoachPlanEntity {
    pub id: Uuid,
    pub name: String,
    pub base_price: Decimal,
    pub commission_rate: Decimal,
    pub max_students: i32,
    pub duration_days: i32,
    pub features: PlanFeatures,
    pub is_active: bool,
}

/// Raw row used for Diesel queries. Features stay as JSON and are parsed
/// into PlanFeatures.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = coach_plan_types)]
pub struct CoachPlanRow {
    pub id: Uuid,
    pub name: String,
    pub base_price: Decimal,
    pub commission_rate: Decimal,
    pub max_students: i32,
    pub duration_days: i32,
    pub features: serde_json::Value,
    pub is_active: bool,
}

impl From<CoachPlanRow> for CoachPlanEntity {
    fn from(value: CoachPlanRow) -> Self {
        Self {
            id: value.id,
            name: value.name,
            base_price: value.base_price,
            commission_rate: value.commission_rate,
            max_students: value.max_students,
            duration_days: value.duration_days,
            features: PlanFeatures::from_db_value(value.features),
            is_active: value.is_active,
        }
    }
}

/// Catalog entry a coach publishes to students.
#[derive(Debug, Clone)]
pub struct SubscriptionPlanEntity {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub duration_days: i32,
    pub features: PlanFeatures,
    pub is_active: bool,
}

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_plans)]
pub struct SubscriptionPlanRow {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub duration_days: i32,
    pub features: serde_json::Value,
    pub is_active: bool,
}

impl From<SubscriptionPlanRow> for SubscriptionPlanEntity {
    fn from(value: SubscriptionPlanRow) -> Self {
        Self {
            id: value.id,
            coach_id: value.coach_id,
            name: value.name,
            price: value.price,
            duration_days: value.duration_days,
            features: PlanFeatures::from_db_value(value.features),
            is_active: value.is_active,
        }
    }
}
