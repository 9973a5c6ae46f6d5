use crate::auth::AuthUser;
use crate::usecases::entitlements::EntitlementUseCase;
use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
};
use crates::{
    domain::{
        repositories::{
            coach_subscriptions::CoachSubscriptionRepository, plans::PlanCatalogRepository,
            student_subscriptions::StudentSubscriptionRepository,
        },
        value_objects::subscriptions::{FeatureCheckDto, QuoteLimitDto},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            coach_subscriptions::CoachSubscriptionPostgres, plans::PlanCatalogPostgres,
            student_subscriptions::StudentSubscriptionPostgres,
        },
    },
};
use std::sync::Arc;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let coach_subscription_repo = CoachSubscriptionPostgres::new(Arc::clone(&db_pool));
    let student_subscription_repo = StudentSubscriptionPostgres::new(Arc::clone(&db_pool));
    let plan_repo = PlanCatalogPostgres::new(Arc::clone(&db_pool));
    let entitlement_usecase = EntitlementUseCase::new(
        Arc::new(coach_subscription_repo),
        Arc::new(student_subscription_repo),
        Arc::new(plan_repo),
    );

    Router::new()
        .route("/quotes/limit", get(custom_quote_limit))
        .route("/:feature_key", get(check_feature))
        .with_state(Arc::new(entitlement_usecase))
}

pub async fn custom_quote_limit<CS, SS, P>(
    State(entitlement_usecase): State<Arc<EntitlementUseCase<CS, SS, P>>>,
    auth: AuthUser,
) -> Response
where
    CS: CoachSubscriptionRepository + Send + Sync + 'static,
    SS: StudentSubscriptionRepository + Send + Sync + 'static,
    P: PlanCatalogRepository + Send + Sync + 'static,
{
    match entitlement_usecase
        .custom_quote_limit(auth.user_id, auth.role)
        .await
    {
        Ok(limit) => Json(QuoteLimitDto { limit }).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

pub async fn check_feature<CS, SS, P>(
    State(entitlement_usecase): State<Arc<EntitlementUseCase<CS, SS, P>>>,
    auth: AuthUser,
    Path(feature_key): Path<String>,
) -> Response
where
    CS: CoachSubscriptionRepository + Send + Sync + 'static,
    SS: StudentSubscriptionRepository + Send + Sync + 'static,
    P: PlanCatalogRepository + Send + Sync + 'static,
{
    match entitlement_usecase
        .has_feature_key(auth.user_id, auth.role, &feature_key)
        .await
    {
        Ok(enabled) => Json(FeatureCheckDto {
            feature: feature_key,
            enabled,
        })
        .into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}
