use serde::{Deserialize, Serialize};

/// Gateway callback envelope: `{"type": "payment", "data": {"id": "..."}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayWebhook {
    #[serde(rename = "type")]
    pub event_type: WebhookEventType,
    pub data: GatewayWebhookData,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WebhookEventType {
    Payment,
    Subscription,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayWebhookData {
    pub id: String,
}

/// `x-signature` material forwarded from the HTTP layer.
#[derive(Debug, Clone)]
pub struct WebhookSignature {
    pub header: String,
    pub request_id: String,
}

/// The gateway redelivers on anything but an acknowledgment, so the endpoint
/// answers this regardless of the inner processing outcome.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self { received: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_payment_webhooks() {
        let webhook: GatewayWebhook =
            serde_json::from_str(r#"{"type": "payment", "data": {"id": "1234567"}}"#).unwrap();
        assert_eq!(webhook.event_type, WebhookEventType::Payment);
        assert_eq!(webhook.data.id, "1234567");
    }

    #[test]
    fn unknown_event_types_fall_through() {
        let webhook: GatewayWebhook =
            serde_json::from_str(r#"{"type": "plan", "data": {"id": "x"}}"#).unwrap();
        assert_eq!(webhook.event_type, WebhookEventType::Unknown);
    }
}
