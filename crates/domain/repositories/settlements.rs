use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::value_objects::revenue_splits::RevenueSplit;

/// Everything needed to apply one approved gateway payment.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovedSettlement {
    pub student_id: Uuid,
    pub plan_id: Uuid,
    pub gateway_payment_id: String,
    pub gateway_preference_id: String,
    pub amount: Decimal,
    pub split: RevenueSplit,
    pub period_days: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Ledger row approved and the subscription period applied.
    Applied { renewed: bool },
    /// The gateway payment id was already settled; nothing changed.
    AlreadyProcessed,
    /// No pending ledger row matched the preference id.
    MissingLedgerRow,
}

#[async_trait]
#[automock]
pub trait SettlementRepository {
    /// Applies the ledger approval and the subscription renew-or-create as a
    /// single transaction; the period extension and the ledger write land
    /// together or not at all.
    async fn apply_approved_settlement(
        &self,
        settlement: ApprovedSettlement,
    ) -> Result<SettlementOutcome>;
}
