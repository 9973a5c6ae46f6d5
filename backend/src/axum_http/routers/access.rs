use crate::auth::AuthUser;
use crate::usecases::access_evaluator::AccessEvaluatorUseCase;
use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use crates::{
    domain::{
        repositories::{
            coach_profiles::CoachProfileRepository,
            coach_subscriptions::CoachSubscriptionRepository,
        },
        value_objects::enums::subscriber_roles::SubscriberRole,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            coach_profiles::CoachProfilePostgres, coach_subscriptions::CoachSubscriptionPostgres,
        },
    },
};
use std::sync::Arc;

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let profile_repo = CoachProfilePostgres::new(Arc::clone(&db_pool));
    let subscription_repo = CoachSubscriptionPostgres::new(Arc::clone(&db_pool));
    let access_usecase =
        AccessEvaluatorUseCase::new(Arc::new(profile_repo), Arc::new(subscription_repo));

    Router::new()
        .route("/me", get(evaluate_access))
        .with_state(Arc::new(access_usecase))
}

pub async fn evaluate_access<P, S>(
    State(access_usecase): State<Arc<AccessEvaluatorUseCase<P, S>>>,
    auth: AuthUser,
) -> Response
where
    P: CoachProfileRepository + Send + Sync + 'static,
    S: CoachSubscriptionRepository + Send + Sync + 'static,
{
    if let Err(rejection) = auth.require_role(SubscriberRole::Coach) {
        return rejection.into_response();
    }

    match access_usecase.evaluate_access(auth.user_id).await {
        Ok(evaluation) => Json(evaluation).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}
