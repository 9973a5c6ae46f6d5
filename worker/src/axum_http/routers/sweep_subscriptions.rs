use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::post,
};
use backend::usecases::lifecycle::LifecycleUseCase;
use crates::domain::repositories::{
    coach_profiles::CoachProfileRepository, coach_subscriptions::CoachSubscriptionRepository,
    plans::PlanCatalogRepository, student_subscriptions::StudentSubscriptionRepository,
};
use serde::Serialize;
use tracing::error;

use crate::config::config_model::DotEnvyConfig;

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT_WORKER/internal/v1/sweep/subscriptions" \
//     -H "Authorization: Bearer $INTERNAL_SWEEP_TOKEN"

pub fn routes<CS, SS, CP, PL>(
    config: Arc<DotEnvyConfig>,
    usecase: Arc<LifecycleUseCase<CS, SS, CP, PL>>,
) -> Router
where
    CS: CoachSubscriptionRepository + Send + Sync + 'static,
    SS: StudentSubscriptionRepository + Send + Sync + 'static,
    CP: CoachProfileRepository + Send + Sync + 'static,
    PL: PlanCatalogRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/subscriptions", post(sweep_subscriptions))
        .with_state((config, usecase))
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub coach_scanned: usize,
    pub coach_canceled: usize,
    pub coach_past_due: usize,
    pub coach_already_transitioned: usize,
    pub coach_failed: usize,
    pub student_scanned: usize,
    pub student_canceled: usize,
    pub student_past_due: usize,
    pub student_already_transitioned: usize,
    pub student_failed: usize,
}

pub async fn sweep_subscriptions<CS, SS, CP, PL>(
    State((config, usecase)): State<(Arc<DotEnvyConfig>, Arc<LifecycleUseCase<CS, SS, CP, PL>>)>,
    headers: HeaderMap,
) -> Response
where
    CS: CoachSubscriptionRepository + Send + Sync + 'static,
    SS: StudentSubscriptionRepository + Send + Sync + 'static,
    CP: CoachProfileRepository + Send + Sync + 'static,
    PL: PlanCatalogRepository + Send + Sync + 'static,
{
    let expected_token = match config.sweep.internal_token.as_deref() {
        Some(token) => token,
        None => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                "sweep token is not configured",
            )
                .into_response();
        }
    };

    if let Err(status) = authorize_bearer(&headers, expected_token) {
        return (status, "unauthorized").into_response();
    }

    match usecase.sweep().await {
        Ok(result) => Json(SweepResponse {
            coach_scanned: result.coach.scanned,
            coach_canceled: result.coach.canceled,
            coach_past_due: result.coach.past_due,
            coach_already_transitioned: result.coach.already_transitioned,
            coach_failed: result.coach.failed,
            student_scanned: result.student.scanned,
            student_canceled: result.student.canceled,
            student_past_due: result.student.past_due,
            student_already_transitioned: result.student.already_transitioned,
            student_failed: result.student.failed,
        })
        .into_response(),
        Err(err) => {
            error!(error = ?err, "sweep_subscriptions: usecase failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "sweep failed").into_response()
        }
    }
}

fn authorize_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), StatusCode> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if token == expected_token {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}
