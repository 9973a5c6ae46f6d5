use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use crates::{
    domain::{
        entities::payment_history::InsertPaymentHistoryEntity,
        repositories::{
            coach_profiles::CoachProfileRepository,
            payment_history::PaymentHistoryRepository,
            plans::PlanCatalogRepository,
            settlements::{ApprovedSettlement, SettlementOutcome, SettlementRepository},
        },
        value_objects::{
            enums::payment_statuses::PaymentStatus,
            revenue_splits::{SplitError, split},
            subscriptions::CheckoutResponse,
            webhooks::{GatewayWebhook, WebhookEventType, WebhookSignature},
        },
    },
    payments::mercado_pago::{
        CreatePreferenceRequest, CreatedPreference, GatewayPayment, MercadoPagoClient,
        PreferenceItem, PreferenceMetadata,
    },
};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Settlement currency used for published plans.
const SETTLEMENT_CURRENCY: &str = "BRL";

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait PaymentGateway: Send + Sync {
    async fn create_preference(
        &self,
        request: CreatePreferenceRequest,
    ) -> AnyResult<CreatedPreference>;

    async fn get_payment(&self, payment_id: &str) -> AnyResult<GatewayPayment>;

    fn verify_webhook_signature(
        &self,
        data_id: &str,
        request_id: &str,
        signature_header: &str,
    ) -> AnyResult<()>;
}

#[async_trait]
impl PaymentGateway for MercadoPagoClient {
    async fn create_preference(
        &self,
        request: CreatePreferenceRequest,
    ) -> AnyResult<CreatedPreference> {
        self.create_preference(&request).await
    }

    async fn get_payment(&self, payment_id: &str) -> AnyResult<GatewayPayment> {
        self.get_payment(payment_id).await
    }

    fn verify_webhook_signature(
        &self,
        data_id: &str,
        request_id: &str,
        signature_header: &str,
    ) -> AnyResult<()> {
        self.verify_webhook_signature(data_id, request_id, signature_header)
    }
}

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("plan not found")]
    PlanNotFound,
    #[error("coach profile not found")]
    CoachNotFound,
    #[error("invalid webhook payload: {0}")]
    InvalidWebhook(String),
    #[error("payment gateway error: {0}")]
    ExternalGateway(String),
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error("ledger integrity violation for preference {0}")]
    IntegrityViolation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl SettlementError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            SettlementError::PlanNotFound | SettlementError::CoachNotFound => {
                StatusCode::NOT_FOUND
            }
            SettlementError::InvalidWebhook(_) | SettlementError::Split(_) => {
                StatusCode::BAD_REQUEST
            }
            SettlementError::ExternalGateway(_) => StatusCode::BAD_GATEWAY,
            SettlementError::IntegrityViolation(_) | SettlementError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// What a processed webhook amounted to; the endpoint acknowledges either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Settled { renewed: bool },
    AlreadyProcessed,
    MarkedRejected,
    MarkedCancelled,
    Ignored,
}

pub struct SettlementUseCase<PH, PL, CP, SR, G>
where
    PH: PaymentHistoryRepository + Send + Sync + 'static,
    PL: PlanCatalogRepository + Send + Sync + 'static,
    CP: CoachProfileRepository + Send + Sync + 'static,
    SR: SettlementRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    payment_history_repo: Arc<PH>,
    plan_repo: Arc<PL>,
    profile_repo: Arc<CP>,
    settlement_repo: Arc<SR>,
    gateway: Arc<G>,
    notification_url: Option<String>,
}

impl<PH, PL, CP, SR, G> SettlementUseCase<PH, PL, CP, SR, G>
where
    PH: PaymentHistoryRepository + Send + Sync + 'static,
    PL: PlanCatalogRepository + Send + Sync + 'static,
    CP: CoachProfileRepository + Send + Sync + 'static,
    SR: SettlementRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(
        payment_history_repo: Arc<PH>,
        plan_repo: Arc<PL>,
        profile_repo: Arc<CP>,
        settlement_repo: Arc<SR>,
        gateway: Arc<G>,
        notification_url: Option<String>,
    ) -> Self {
        Self {
            payment_history_repo,
            plan_repo,
            profile_repo,
            settlement_repo,
            gateway,
            notification_url,
        }
    }

    /// Creates a gateway preference for the plan and opens the pending ledger
    /// row the webhook will later settle against.
    pub async fn create_checkout(
        &self,
        student_id: Uuid,
        plan_id: Uuid,
    ) -> Result<CheckoutResponse, SettlementError> {
        let plan = self
            .plan_repo
            .find_active_subscription_plan(plan_id)
            .await
            .map_err(|err| {
                error!(%student_id, %plan_id, db_error = ?err, "settlements: failed to load plan");
                SettlementError::Internal(err)
            })?
            .ok_or(SettlementError::PlanNotFound)?;

        let request = CreatePreferenceRequest {
            items: vec![PreferenceItem {
                title: plan.name.clone(),
                quantity: 1,
                unit_price: plan.price,
                currency_id: SETTLEMENT_CURRENCY.to_string(),
            }],
            external_reference: format!("{student_id}:{plan_id}"),
            metadata: PreferenceMetadata {
                user_id: student_id,
                plan_id,
            },
            notification_url: self.notification_url.clone(),
        };

        let preference = self
            .gateway
            .create_preference(request)
            .await
            .map_err(|err| {
                error!(%student_id, %plan_id, error = ?err, "settlements: preference creation failed");
                SettlementError::ExternalGateway(err.to_string())
            })?;

        self.payment_history_repo
            .append(InsertPaymentHistoryEntity {
                student_id,
                plan_id,
                amount: plan.price,
                currency: SETTLEMENT_CURRENCY.to_string(),
                status: PaymentStatus::Pending.to_string(),
                gateway_preference_id: preference.id.clone(),
            })
            .await
            .map_err(|err| {
                error!(%student_id, %plan_id, db_error = ?err, "settlements: failed to open ledger row");
                SettlementError::Internal(err)
            })?;

        info!(
            %student_id,
            %plan_id,
            preference_id = %preference.id,
            "settlements: checkout created"
        );

        Ok(CheckoutResponse {
            preference_id: preference.id,
            init_point: preference.init_point,
        })
    }

    pub async fn process_webhook(
        &self,
        webhook: GatewayWebhook,
        signature: Option<WebhookSignature>,
    ) -> Result<WebhookOutcome, SettlementError> {
        if let Some(signature) = signature {
            self.gateway
                .verify_webhook_signature(&webhook.data.id, &signature.request_id, &signature.header)
                .map_err(|err| {
                    warn!(error = %err, "settlements: webhook signature verification failed");
                    SettlementError::InvalidWebhook("signature verification failed".to_string())
                })?;
        }

        match webhook.event_type {
            WebhookEventType::Payment => self.process_payment_event(&webhook.data.id).await,
            WebhookEventType::Subscription => {
                debug!(data_id = %webhook.data.id, "settlements: ignoring subscription event");
                Ok(WebhookOutcome::Ignored)
            }
            WebhookEventType::Unknown => {
                debug!(data_id = %webhook.data.id, "settlements: ignoring unknown event type");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn process_payment_event(
        &self,
        gateway_payment_id: &str,
    ) -> Result<WebhookOutcome, SettlementError> {
        // Dedupe before acting: a replay must not trigger a second gateway
        // fetch, let alone a second renewal.
        if let Some(existing) = self
            .payment_history_repo
            .find_by_gateway_payment_id(gateway_payment_id)
            .await
            .map_err(|err| {
                error!(gateway_payment_id, db_error = ?err, "settlements: dedupe lookup failed");
                SettlementError::Internal(err)
            })?
        {
            if PaymentStatus::from_str(&existing.status).is_some_and(|status| status.is_terminal())
            {
                info!(gateway_payment_id, "settlements: webhook replay for settled payment");
                return Ok(WebhookOutcome::AlreadyProcessed);
            }
        }

        let payment = self
            .gateway
            .get_payment(gateway_payment_id)
            .await
            .map_err(|err| {
                // Timeouts included; the gateway redelivers, so failing here is safe.
                error!(gateway_payment_id, error = ?err, "settlements: payment detail fetch failed");
                SettlementError::ExternalGateway(err.to_string())
            })?;

        let preference_id = payment.preference_id.clone().ok_or_else(|| {
            SettlementError::InvalidWebhook("payment detail missing preference id".to_string())
        })?;

        match payment.status.as_str() {
            "approved" => {
                self.settle_approved(gateway_payment_id, &preference_id, &payment)
                    .await
            }
            "rejected" => {
                self.mark_payment(gateway_payment_id, &preference_id, PaymentStatus::Rejected)
                    .await?;
                Ok(WebhookOutcome::MarkedRejected)
            }
            "cancelled" => {
                self.mark_payment(gateway_payment_id, &preference_id, PaymentStatus::Cancelled)
                    .await?;
                Ok(WebhookOutcome::MarkedCancelled)
            }
            other => {
                debug!(
                    gateway_payment_id,
                    status = other,
                    "settlements: ignoring non-terminal payment status"
                );
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn settle_approved(
        &self,
        gateway_payment_id: &str,
        preference_id: &str,
        payment: &GatewayPayment,
    ) -> Result<WebhookOutcome, SettlementError> {
        let student_id = payment
            .metadata
            .user_id
            .as_deref()
            .and_then(|value| Uuid::parse_str(value).ok())
            .ok_or_else(|| {
                SettlementError::InvalidWebhook("missing user_id in payment metadata".to_string())
            })?;
        let plan_id = payment
            .metadata
            .plan_id
            .as_deref()
            .and_then(|value| Uuid::parse_str(value).ok())
            .ok_or_else(|| {
                SettlementError::InvalidWebhook("missing plan_id in payment metadata".to_string())
            })?;

        let plan = self
            .plan_repo
            .find_active_subscription_plan(plan_id)
            .await
            .map_err(|err| {
                error!(%student_id, %plan_id, db_error = ?err, "settlements: failed to load plan");
                SettlementError::Internal(err)
            })?
            .ok_or(SettlementError::PlanNotFound)?;

        let profile = self
            .profile_repo
            .find_by_id(plan.coach_id)
            .await
            .map_err(|err| {
                error!(
                    coach_id = %plan.coach_id,
                    db_error = ?err,
                    "settlements: failed to load coach profile"
                );
                SettlementError::Internal(err)
            })?
            .ok_or(SettlementError::CoachNotFound)?;

        // The stored pair governs settlement; drift surfaces as InvalidRateSum
        // instead of being silently re-derived.
        let split = split(
            payment.transaction_amount,
            profile.commission_rate,
            profile.platform_commission_rate,
        )?;

        let settlement = ApprovedSettlement {
            student_id,
            plan_id,
            gateway_payment_id: gateway_payment_id.to_string(),
            gateway_preference_id: preference_id.to_string(),
            amount: payment.transaction_amount,
            split,
            period_days: plan.duration_days.into(),
        };

        match self
            .settlement_repo
            .apply_approved_settlement(settlement)
            .await
            .map_err(|err| {
                error!(
                    gateway_payment_id,
                    preference_id,
                    db_error = ?err,
                    "settlements: failed to apply settlement"
                );
                SettlementError::Internal(err)
            })? {
            SettlementOutcome::Applied { renewed } => {
                info!(
                    %student_id,
                    %plan_id,
                    gateway_payment_id,
                    coach_amount = %split.coach_amount,
                    platform_amount = %split.platform_amount,
                    renewed,
                    "settlements: payment settled"
                );
                Ok(WebhookOutcome::Settled { renewed })
            }
            SettlementOutcome::AlreadyProcessed => {
                info!(gateway_payment_id, "settlements: settlement raced a replay");
                Ok(WebhookOutcome::AlreadyProcessed)
            }
            SettlementOutcome::MissingLedgerRow => {
                error!(
                    gateway_payment_id,
                    preference_id,
                    "settlements: no pending ledger row for approved payment"
                );
                Err(SettlementError::IntegrityViolation(
                    preference_id.to_string(),
                ))
            }
        }
    }

    async fn mark_payment(
        &self,
        gateway_payment_id: &str,
        preference_id: &str,
        status: PaymentStatus,
    ) -> Result<(), SettlementError> {
        let updated = self
            .payment_history_repo
            .mark_status_by_preference_id(preference_id, gateway_payment_id, status)
            .await
            .map_err(|err| {
                error!(
                    gateway_payment_id,
                    preference_id,
                    db_error = ?err,
                    "settlements: failed to mark ledger row"
                );
                SettlementError::Internal(err)
            })?;

        if !updated {
            warn!(
                gateway_payment_id,
                preference_id,
                status = %status,
                "settlements: no pending ledger row to mark"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crates::domain::{
        entities::coach_profiles::CoachProfileEntity,
        entities::payment_history::PaymentHistoryEntity,
        entities::plans::SubscriptionPlanEntity,
        repositories::{
            coach_profiles::MockCoachProfileRepository,
            payment_history::MockPaymentHistoryRepository,
            plans::MockPlanCatalogRepository,
            settlements::MockSettlementRepository,
        },
        value_objects::plans::PlanFeatures,
        value_objects::webhooks::GatewayWebhookData,
    };
    use crates::payments::mercado_pago::GatewayPaymentMetadata;
    use mockall::predicate::eq;
    use rust_decimal::Decimal;

    fn payment_webhook(id: &str) -> GatewayWebhook {
        GatewayWebhook {
            event_type: WebhookEventType::Payment,
            data: GatewayWebhookData { id: id.to_string() },
        }
    }

    fn sample_plan(plan_id: Uuid, coach_id: Uuid) -> SubscriptionPlanEntity {
        SubscriptionPlanEntity {
            id: plan_id,
            coach_id,
            name: "Strength Cycle".to_string(),
            price: Decimal::from(1000),
            duration_days: 30,
            features: PlanFeatures::default(),
            is_active: true,
        }
    }

    fn sample_profile(coach_id: Uuid, coach_rate: i64, platform_rate: i64) -> CoachProfileEntity {
        let now = Utc::now();
        CoachProfileEntity {
            id: coach_id,
            max_students: 50,
            trial_ends_at: None,
            commission_rate: Decimal::from(coach_rate),
            platform_commission_rate: Decimal::from(platform_rate),
            created_at: now,
            updated_at: now,
        }
    }

    fn approved_payment(student_id: Uuid, plan_id: Uuid, amount: i64) -> GatewayPayment {
        GatewayPayment {
            id: 777,
            status: "approved".to_string(),
            preference_id: Some("pref-1".to_string()),
            transaction_amount: Decimal::from(amount),
            currency_id: Some("BRL".to_string()),
            metadata: GatewayPaymentMetadata {
                user_id: Some(student_id.to_string()),
                plan_id: Some(plan_id.to_string()),
            },
        }
    }

    fn settled_ledger_row(gateway_payment_id: &str) -> PaymentHistoryEntity {
        let now = Utc::now();
        PaymentHistoryEntity {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            amount: Decimal::from(1000),
            currency: "BRL".to_string(),
            status: PaymentStatus::Approved.to_string(),
            coach_amount: Some(Decimal::from(880)),
            platform_amount: Some(Decimal::from(120)),
            gateway_payment_id: Some(gateway_payment_id.to_string()),
            gateway_preference_id: "pref-1".to_string(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn usecase(
        payment_history_repo: MockPaymentHistoryRepository,
        plan_repo: MockPlanCatalogRepository,
        profile_repo: MockCoachProfileRepository,
        settlement_repo: MockSettlementRepository,
        gateway: MockPaymentGateway,
    ) -> SettlementUseCase<
        MockPaymentHistoryRepository,
        MockPlanCatalogRepository,
        MockCoachProfileRepository,
        MockSettlementRepository,
        MockPaymentGateway,
    > {
        SettlementUseCase::new(
            Arc::new(payment_history_repo),
            Arc::new(plan_repo),
            Arc::new(profile_repo),
            Arc::new(settlement_repo),
            Arc::new(gateway),
            None,
        )
    }

    #[tokio::test]
    async fn approved_payment_settles_with_the_stored_rates() {
        let student_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let coach_id = Uuid::new_v4();

        let mut payment_history_repo = MockPaymentHistoryRepository::new();
        let mut plan_repo = MockPlanCatalogRepository::new();
        let mut profile_repo = MockCoachProfileRepository::new();
        let mut settlement_repo = MockSettlementRepository::new();
        let mut gateway = MockPaymentGateway::new();

        payment_history_repo
            .expect_find_by_gateway_payment_id()
            .with(eq("777"))
            .returning(|_| Box::pin(async { Ok(None) }));

        let payment = approved_payment(student_id, plan_id, 1000);
        gateway.expect_get_payment().with(eq("777")).returning(move |_| {
            let payment = payment.clone();
            Box::pin(async move { Ok(payment) })
        });

        let plan = sample_plan(plan_id, coach_id);
        plan_repo
            .expect_find_active_subscription_plan()
            .with(eq(plan_id))
            .returning(move |_| {
                let plan = plan.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        let profile = sample_profile(coach_id, 88, 12);
        profile_repo
            .expect_find_by_id()
            .with(eq(coach_id))
            .returning(move |_| {
                let profile = profile.clone();
                Box::pin(async move { Ok(Some(profile)) })
            });

        settlement_repo
            .expect_apply_approved_settlement()
            .withf(move |settlement| {
                settlement.student_id == student_id
                    && settlement.plan_id == plan_id
                    && settlement.gateway_payment_id == "777"
                    && settlement.gateway_preference_id == "pref-1"
                    && settlement.split.coach_amount == Decimal::from(880)
                    && settlement.split.platform_amount == Decimal::from(120)
                    && settlement.period_days == 30
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(SettlementOutcome::Applied { renewed: true }) }));

        let outcome = usecase(
            payment_history_repo,
            plan_repo,
            profile_repo,
            settlement_repo,
            gateway,
        )
        .process_webhook(payment_webhook("777"), None)
        .await
        .unwrap();

        assert_eq!(outcome, WebhookOutcome::Settled { renewed: true });
    }

    #[tokio::test]
    async fn replayed_webhook_never_reaches_the_gateway_again() {
        let mut payment_history_repo = MockPaymentHistoryRepository::new();

        let row = settled_ledger_row("777");
        payment_history_repo
            .expect_find_by_gateway_payment_id()
            .with(eq("777"))
            .returning(move |_| {
                let row = row.clone();
                Box::pin(async move { Ok(Some(row)) })
            });

        // No expectations on the gateway or the settlement repo: a second
        // fetch or renewal would panic the test.
        let outcome = usecase(
            payment_history_repo,
            MockPlanCatalogRepository::new(),
            MockCoachProfileRepository::new(),
            MockSettlementRepository::new(),
            MockPaymentGateway::new(),
        )
        .process_webhook(payment_webhook("777"), None)
        .await
        .unwrap();

        assert_eq!(outcome, WebhookOutcome::AlreadyProcessed);
    }

    #[tokio::test]
    async fn drifted_rates_fail_the_settlement_loudly() {
        let student_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let coach_id = Uuid::new_v4();

        let mut payment_history_repo = MockPaymentHistoryRepository::new();
        let mut plan_repo = MockPlanCatalogRepository::new();
        let mut profile_repo = MockCoachProfileRepository::new();
        let mut gateway = MockPaymentGateway::new();

        payment_history_repo
            .expect_find_by_gateway_payment_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let payment = approved_payment(student_id, plan_id, 1000);
        gateway.expect_get_payment().returning(move |_| {
            let payment = payment.clone();
            Box::pin(async move { Ok(payment) })
        });

        let plan = sample_plan(plan_id, coach_id);
        plan_repo
            .expect_find_active_subscription_plan()
            .returning(move |_| {
                let plan = plan.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        // Historical drift: 88 + 13 no longer sums to 100.
        let profile = sample_profile(coach_id, 88, 13);
        profile_repo.expect_find_by_id().returning(move |_| {
            let profile = profile.clone();
            Box::pin(async move { Ok(Some(profile)) })
        });

        let result = usecase(
            payment_history_repo,
            plan_repo,
            profile_repo,
            MockSettlementRepository::new(),
            gateway,
        )
        .process_webhook(payment_webhook("777"), None)
        .await;

        assert!(matches!(
            result,
            Err(SettlementError::Split(SplitError::InvalidRateSum { .. }))
        ));
    }

    #[tokio::test]
    async fn rejected_payment_only_marks_the_ledger() {
        let mut payment_history_repo = MockPaymentHistoryRepository::new();
        let mut gateway = MockPaymentGateway::new();

        payment_history_repo
            .expect_find_by_gateway_payment_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        gateway.expect_get_payment().returning(|_| {
            Box::pin(async {
                Ok(GatewayPayment {
                    id: 778,
                    status: "rejected".to_string(),
                    preference_id: Some("pref-2".to_string()),
                    transaction_amount: Decimal::from(1000),
                    currency_id: Some("BRL".to_string()),
                    metadata: GatewayPaymentMetadata::default(),
                })
            })
        });

        payment_history_repo
            .expect_mark_status_by_preference_id()
            .with(eq("pref-2"), eq("778"), eq(PaymentStatus::Rejected))
            .times(1)
            .returning(|_, _, _| Box::pin(async { Ok(true) }));

        let outcome = usecase(
            payment_history_repo,
            MockPlanCatalogRepository::new(),
            MockCoachProfileRepository::new(),
            MockSettlementRepository::new(),
            gateway,
        )
        .process_webhook(payment_webhook("778"), None)
        .await
        .unwrap();

        assert_eq!(outcome, WebhookOutcome::MarkedRejected);
    }

    #[tokio::test]
    async fn approved_payment_without_a_pending_row_is_an_integrity_violation() {
        let student_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let coach_id = Uuid::new_v4();

        let mut payment_history_repo = MockPaymentHistoryRepository::new();
        let mut plan_repo = MockPlanCatalogRepository::new();
        let mut profile_repo = MockCoachProfileRepository::new();
        let mut settlement_repo = MockSettlementRepository::new();
        let mut gateway = MockPaymentGateway::new();

        payment_history_repo
            .expect_find_by_gateway_payment_id()
            .returning(|_| Box::pin(async { Ok(None) }));

        let payment = approved_payment(student_id, plan_id, 1000);
        gateway.expect_get_payment().returning(move |_| {
            let payment = payment.clone();
            Box::pin(async move { Ok(payment) })
        });

        let plan = sample_plan(plan_id, coach_id);
        plan_repo
            .expect_find_active_subscription_plan()
            .returning(move |_| {
                let plan = plan.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        let profile = sample_profile(coach_id, 88, 12);
        profile_repo.expect_find_by_id().returning(move |_| {
            let profile = profile.clone();
            Box::pin(async move { Ok(Some(profile)) })
        });

        settlement_repo
            .expect_apply_approved_settlement()
            .returning(|_| Box::pin(async { Ok(SettlementOutcome::MissingLedgerRow) }));

        let result = usecase(
            payment_history_repo,
            plan_repo,
            profile_repo,
            settlement_repo,
            gateway,
        )
        .process_webhook(payment_webhook("777"), None)
        .await;

        assert!(matches!(result, Err(SettlementError::IntegrityViolation(_))));
    }

    #[tokio::test]
    async fn subscription_events_are_acknowledged_and_ignored() {
        let webhook = GatewayWebhook {
            event_type: WebhookEventType::Subscription,
            data: GatewayWebhookData {
                id: "sub-1".to_string(),
            },
        };

        let outcome = usecase(
            MockPaymentHistoryRepository::new(),
            MockPlanCatalogRepository::new(),
            MockCoachProfileRepository::new(),
            MockSettlementRepository::new(),
            MockPaymentGateway::new(),
        )
        .process_webhook(webhook, None)
        .await
        .unwrap();

        assert_eq!(outcome, WebhookOutcome::Ignored);
    }

    #[tokio::test]
    async fn checkout_opens_a_pending_ledger_row() {
        let student_id = Uuid::new_v4();
        let plan_id = Uuid::new_v4();
        let coach_id = Uuid::new_v4();

        let mut payment_history_repo = MockPaymentHistoryRepository::new();
        let mut plan_repo = MockPlanCatalogRepository::new();
        let mut gateway = MockPaymentGateway::new();

        let plan = sample_plan(plan_id, coach_id);
        plan_repo
            .expect_find_active_subscription_plan()
            .with(eq(plan_id))
            .returning(move |_| {
                let plan = plan.clone();
                Box::pin(async move { Ok(Some(plan)) })
            });

        gateway
            .expect_create_preference()
            .withf(move |request| {
                request.metadata.user_id == student_id && request.metadata.plan_id == plan_id
            })
            .returning(|_| {
                Box::pin(async {
                    Ok(CreatedPreference {
                        id: "pref-9".to_string(),
                        init_point: "https://gateway.test/checkout/pref-9".to_string(),
                    })
                })
            });

        payment_history_repo
            .expect_append()
            .withf(move |row| {
                row.student_id == student_id
                    && row.plan_id == plan_id
                    && row.status == PaymentStatus::Pending.to_string()
                    && row.gateway_preference_id == "pref-9"
            })
            .times(1)
            .returning(|_| Box::pin(async { Ok(Uuid::new_v4()) }));

        let checkout = usecase(
            payment_history_repo,
            plan_repo,
            MockCoachProfileRepository::new(),
            MockSettlementRepository::new(),
            gateway,
        )
        .create_checkout(student_id, plan_id)
        .await
        .unwrap();

        assert_eq!(checkout.preference_id, "pref-9");
    }
}
