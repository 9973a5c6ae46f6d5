use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::coach_subscriptions::CoachSubscriptionEntity;
use crate::domain::entities::plans::CoachPlanEntity;
use crate::domain::value_objects::enums::subscription_statuses::SubscriptionStatus;
use crate::domain::value_objects::plans::PlanFeatures;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoachSubscriptionModel {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub plan_id: Uuid,
    pub status: SubscriptionStatus,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<DateTime<Utc>>,
}

impl From<CoachSubscriptionEntity> for CoachSubscriptionModel {
    fn from(value: CoachSubscriptionEntity) -> Self {
        Self {
            id: value.id,
            coach_id: value.coach_id,
            plan_id: value.plan_id,
            // Rows with an unrecognized status must never read as granting access.
            status: SubscriptionStatus::from_str(&value.status)
                .unwrap_or(SubscriptionStatus::Canceled),
            current_period_start: value.current_period_start,
            current_period_end: value.current_period_end,
            cancel_at_period_end: value.cancel_at_period_end,
            canceled_at: value.canceled_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CoachPlanDto {
    pub id: Uuid,
    pub name: String,
    pub base_price: Decimal,
    pub commission_rate: Decimal,
    pub max_students: i32,
    pub duration_days: i32,
    pub features: PlanFeatures,
}

impl From<CoachPlanEntity> for CoachPlanDto {
    fn from(value: CoachPlanEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            base_price: value.base_price,
            commission_rate: value.commission_rate,
            max_students: value.max_students,
            duration_days: value.duration_days,
            features: value.features,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CurrentSubscriptionDto {
    pub plan_id: Uuid,
    pub plan_name: String,
    pub status: SubscriptionStatus,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub cancel_at_period_end: bool,
    pub features: PlanFeatures,
}

#[derive(Debug, Deserialize)]
pub struct ChangePlanRequest {
    pub plan_id: Uuid,
    #[serde(default)]
    pub start_as_trial: bool,
}

#[derive(Debug, Serialize)]
pub struct ChangePlanResponse {
    pub subscription_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub plan_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub preference_id: String,
    pub init_point: String,
}

#[derive(Debug, Serialize)]
pub struct FeatureCheckDto {
    pub feature: String,
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct QuoteLimitDto {
    pub limit: i32,
}

#[derive(Debug, Serialize)]
pub struct CommissionRefreshResponse {
    pub student_count: i64,
    pub coach_rate: Decimal,
    pub platform_rate: Decimal,
}
