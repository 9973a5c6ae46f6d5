use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::payment_history::{InsertPaymentHistoryEntity, PaymentHistoryEntity};
use crate::domain::value_objects::enums::payment_statuses::PaymentStatus;

#[async_trait]
#[automock]
pub trait PaymentHistoryRepository {
    async fn append(&self, row: InsertPaymentHistoryEntity) -> Result<Uuid>;

    async fn find_by_gateway_payment_id(
        &self,
        gateway_payment_id: &str,
    ) -> Result<Option<PaymentHistoryEntity>>;

    /// Moves the matching pending row to `status`, stamping the gateway
    /// payment id. Returns false when no pending row matched.
    async fn mark_status_by_preference_id(
        &self,
        gateway_preference_id: &str,
        gateway_payment_id: &str,
        status: PaymentStatus,
    ) -> Result<bool>;
}
