use crate::auth::AuthUser;
use crate::usecases::lifecycle::LifecycleUseCase;
use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::{
            coach_profiles::CoachProfileRepository,
            coach_subscriptions::CoachSubscriptionRepository, plans::PlanCatalogRepository,
            student_subscriptions::StudentSubscriptionRepository,
        },
        value_objects::{
            enums::subscriber_roles::SubscriberRole,
            subscriptions::{ChangePlanRequest, ChangePlanResponse, CommissionRefreshResponse},
        },
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            coach_profiles::CoachProfilePostgres, coach_subscriptions::CoachSubscriptionPostgres,
            plans::PlanCatalogPostgres, student_subscriptions::StudentSubscriptionPostgres,
        },
    },
};
use std::sync::Arc;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let coach_subscription_repo = CoachSubscriptionPostgres::new(Arc::clone(&db_pool));
    let student_subscription_repo = StudentSubscriptionPostgres::new(Arc::clone(&db_pool));
    let profile_repo = CoachProfilePostgres::new(Arc::clone(&db_pool));
    let plan_repo = PlanCatalogPostgres::new(Arc::clone(&db_pool));
    let lifecycle_usecase = LifecycleUseCase::new(
        Arc::new(coach_subscription_repo),
        Arc::new(student_subscription_repo),
        Arc::new(profile_repo),
        Arc::new(plan_repo),
    );

    Router::new()
        .route("/plans", get(list_plans))
        .route("/current", get(current_subscription))
        .route("/change-plan", post(change_plan))
        .route("/cancel", post(cancel_at_period_end))
        .route("/cancel-now", post(cancel_now))
        .route("/commission/refresh", post(refresh_commission_rates))
        .with_state(Arc::new(lifecycle_usecase))
}

pub async fn list_plans<CS, SS, CP, PL>(
    State(lifecycle_usecase): State<Arc<LifecycleUseCase<CS, SS, CP, PL>>>,
    _auth: AuthUser,
) -> Response
where
    CS: CoachSubscriptionRepository + Send + Sync + 'static,
    SS: StudentSubscriptionRepository + Send + Sync + 'static,
    CP: CoachProfileRepository + Send + Sync + 'static,
    PL: PlanCatalogRepository + Send + Sync + 'static,
{
    match lifecycle_usecase.list_plans().await {
        Ok(plans) => Json(plans).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

pub async fn current_subscription<CS, SS, CP, PL>(
    State(lifecycle_usecase): State<Arc<LifecycleUseCase<CS, SS, CP, PL>>>,
    auth: AuthUser,
) -> Response
where
    CS: CoachSubscriptionRepository + Send + Sync + 'static,
    SS: StudentSubscriptionRepository + Send + Sync + 'static,
    CP: CoachProfileRepository + Send + Sync + 'static,
    PL: PlanCatalogRepository + Send + Sync + 'static,
{
    if let Err(rejection) = auth.require_role(SubscriberRole::Coach) {
        return rejection.into_response();
    }

    match lifecycle_usecase.current_subscription(auth.user_id).await {
        Ok(current) => Json(current).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

pub async fn change_plan<CS, SS, CP, PL>(
    State(lifecycle_usecase): State<Arc<LifecycleUseCase<CS, SS, CP, PL>>>,
    auth: AuthUser,
    Json(change_plan_request): Json<ChangePlanRequest>,
) -> Response
where
    CS: CoachSubscriptionRepository + Send + Sync + 'static,
    SS: StudentSubscriptionRepository + Send + Sync + 'static,
    CP: CoachProfileRepository + Send + Sync + 'static,
    PL: PlanCatalogRepository + Send + Sync + 'static,
{
    if let Err(rejection) = auth.require_role(SubscriberRole::Coach) {
        return rejection.into_response();
    }

    match lifecycle_usecase
        .change_plan(
            auth.user_id,
            change_plan_request.plan_id,
            change_plan_request.start_as_trial,
        )
        .await
    {
        Ok(subscription_id) => Json(ChangePlanResponse { subscription_id }).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

pub async fn cancel_at_period_end<CS, SS, CP, PL>(
    State(lifecycle_usecase): State<Arc<LifecycleUseCase<CS, SS, CP, PL>>>,
    auth: AuthUser,
) -> Response
where
    CS: CoachSubscriptionRepository + Send + Sync + 'static,
    SS: StudentSubscriptionRepository + Send + Sync + 'static,
    CP: CoachProfileRepository + Send + Sync + 'static,
    PL: PlanCatalogRepository + Send + Sync + 'static,
{
    if let Err(rejection) = auth.require_role(SubscriberRole::Coach) {
        return rejection.into_response();
    }

    match lifecycle_usecase.cancel_at_period_end(auth.user_id).await {
        Ok(()) => axum::http::StatusCode::NO_CONTENT.into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

pub async fn cancel_now<CS, SS, CP, PL>(
    State(lifecycle_usecase): State<Arc<LifecycleUseCase<CS, SS, CP, PL>>>,
    auth: AuthUser,
) -> Response
where
    CS: CoachSubscriptionRepository + Send + Sync + 'static,
    SS: StudentSubscriptionRepository + Send + Sync + 'static,
    CP: CoachProfileRepository + Send + Sync + 'static,
    PL: PlanCatalogRepository + Send + Sync + 'static,
{
    if let Err(rejection) = auth.require_role(SubscriberRole::Coach) {
        return rejection.into_response();
    }

    match lifecycle_usecase.cancel_now(auth.user_id).await {
        Ok(()) => axum::http::StatusCode::NO_CONTENT.into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

pub async fn refresh_commission_rates<CS, SS, CP, PL>(
    State(lifecycle_usecase): State<Arc<LifecycleUseCase<CS, SS, CP, PL>>>,
    auth: AuthUser,
) -> Response
where
    CS: CoachSubscriptionRepository + Send + Sync + 'static,
    SS: StudentSubscriptionRepository + Send + Sync + 'static,
    CP: CoachProfileRepository + Send + Sync + 'static,
    PL: PlanCatalogRepository + Send + Sync + 'static,
{
    if let Err(rejection) = auth.require_role(SubscriberRole::Coach) {
        return rejection.into_response();
    }

    match lifecycle_usecase.refresh_commission_rates(auth.user_id).await {
        Ok(refresh) => Json(CommissionRefreshResponse {
            student_count: refresh.student_count,
            coach_rate: refresh.rates.coach_rate,
            platform_rate: refresh.rates.platform_rate,
        })
        .into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}
