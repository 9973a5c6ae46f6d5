use crate::auth::AuthUser;
use crate::usecases::settlements::SettlementUseCase;
use axum::{
    Json, Router,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::post,
};
use crates::{
    domain::{
        repositories::{
            coach_profiles::CoachProfileRepository,
            payment_history::PaymentHistoryRepository, plans::PlanCatalogRepository,
            settlements::SettlementRepository,
        },
        value_objects::{
            enums::subscriber_roles::SubscriberRole,
            subscriptions::CheckoutRequest,
            webhooks::{GatewayWebhook, WebhookAck, WebhookSignature},
        },
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            coach_profiles::CoachProfilePostgres, payment_history::PaymentHistoryPostgres,
            plans::PlanCatalogPostgres, settlements::SettlementPostgres,
        },
    },
    payments::mercado_pago::MercadoPagoClient,
};
use std::sync::Arc;
use tracing::error;

use crate::usecases::settlements::PaymentGateway;

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    gateway: Arc<MercadoPagoClient>,
    notification_url: Option<String>,
) -> Router {
    let payment_history_repo = PaymentHistoryPostgres::new(Arc::clone(&db_pool));
    let plan_repo = PlanCatalogPostgres::new(Arc::clone(&db_pool));
    let profile_repo = CoachProfilePostgres::new(Arc::clone(&db_pool));
    let settlement_repo = SettlementPostgres::new(Arc::clone(&db_pool));
    let settlement_usecase = SettlementUseCase::new(
        Arc::new(payment_history_repo),
        Arc::new(plan_repo),
        Arc::new(profile_repo),
        Arc::new(settlement_repo),
        gateway,
        notification_url,
    );

    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/webhooks/payments", post(payment_webhook))
        .with_state(Arc::new(settlement_usecase))
}

pub async fn create_checkout<PH, PL, CP, SR, G>(
    State(settlement_usecase): State<Arc<SettlementUseCase<PH, PL, CP, SR, G>>>,
    auth: AuthUser,
    Json(checkout_request): Json<CheckoutRequest>,
) -> Response
where
    PH: PaymentHistoryRepository + Send + Sync + 'static,
    PL: PlanCatalogRepository + Send + Sync + 'static,
    CP: CoachProfileRepository + Send + Sync + 'static,
    SR: SettlementRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    if let Err(rejection) = auth.require_role(SubscriberRole::Student) {
        return rejection.into_response();
    }

    match settlement_usecase
        .create_checkout(auth.user_id, checkout_request.plan_id)
        .await
    {
        Ok(checkout) => Json(checkout).into_response(),
        Err(err) => (err.status_code(), err.to_string()).into_response(),
    }
}

/// Gateway callback. Always acknowledges: the gateway cannot fix
/// application-level failures and must not retry indefinitely, so inner
/// errors are logged and swallowed here.
pub async fn payment_webhook<PH, PL, CP, SR, G>(
    State(settlement_usecase): State<Arc<SettlementUseCase<PH, PL, CP, SR, G>>>,
    headers: HeaderMap,
    Json(webhook): Json<GatewayWebhook>,
) -> Response
where
    PH: PaymentHistoryRepository + Send + Sync + 'static,
    PL: PlanCatalogRepository + Send + Sync + 'static,
    CP: CoachProfileRepository + Send + Sync + 'static,
    SR: SettlementRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let signature = headers
        .get("x-signature")
        .and_then(|value| value.to_str().ok())
        .map(|header| WebhookSignature {
            header: header.to_string(),
            request_id: headers
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_string(),
        });

    if let Err(err) = settlement_usecase.process_webhook(webhook, signature).await {
        error!(error = ?err, "billing: payment webhook processing failed");
    }

    Json(WebhookAck::received()).into_response()
}
