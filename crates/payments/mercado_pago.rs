use std::time::Duration;

use anyhow::{Result, anyhow};
use hmac::{Hmac, Mac};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Every gateway call is bounded; a hung gateway must surface as a retryable
/// failure, never as implicit success.
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimal Mercado Pago client built on reqwest.
pub struct MercadoPagoClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    webhook_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePreferenceRequest {
    pub items: Vec<PreferenceItem>,
    pub external_reference: String,
    pub metadata: PreferenceMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreferenceItem {
    pub title: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub currency_id: String,
}

/// Travels to the gateway and comes back on the payment detail; settlement is
/// keyed by it.
#[derive(Debug, Clone, Serialize)]
pub struct PreferenceMetadata {
    pub user_id: Uuid,
    pub plan_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPreference {
    pub id: String,
    pub init_point: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPayment {
    pub id: i64,
    pub status: String,
    pub preference_id: Option<String>,
    pub transaction_amount: Decimal,
    pub currency_id: Option<String>,
    #[serde(default)]
    pub metadata: GatewayPaymentMetadata,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayPaymentMetadata {
    pub user_id: Option<String>,
    pub plan_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorEnvelope {
    message: Option<String>,
    error: Option<String>,
    status: Option<i32>,
}

impl MercadoPagoClient {
    pub fn new(
        base_url: String,
        access_token: String,
        webhook_secret: Option<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(GATEWAY_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url,
            access_token,
            webhook_secret,
        })
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let request_id = resp
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let (gateway_message, gateway_error, gateway_status) =
            match serde_json::from_str::<GatewayErrorEnvelope>(&body) {
                Ok(envelope) => (envelope.message, envelope.error, envelope.status),
                Err(_) => (None, None, None),
            };

        error!(
            status = %status,
            gateway_request_id = ?request_id,
            gateway_message = ?gateway_message,
            gateway_error = ?gateway_error,
            gateway_status = ?gateway_status,
            response_body = %body,
            context = %context,
            "mercado pago api request failed"
        );

        anyhow::bail!(
            "Mercado Pago API request failed: {} (status {}, request_id={:?})",
            context,
            status,
            request_id
        );
    }

    /// Creates a checkout preference.
    /// https://www.mercadopago.com/developers/en/reference/preferences/_checkout_preferences/post
    pub async fn create_preference(
        &self,
        request: &CreatePreferenceRequest,
    ) -> Result<CreatedPreference> {
        let resp = self
            .http
            .post(format!("{}/checkout/preferences", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create preference").await?;

        let preference: CreatedPreference = resp.json().await?;
        Ok(preference)
    }

    /// Fetches the payment detail referenced by a webhook.
    /// https://www.mercadopago.com/developers/en/reference/payments/_payments_id/get
    pub async fn get_payment(&self, payment_id: &str) -> Result<GatewayPayment> {
        let resp = self
            .http
            .get(format!("{}/v1/payments/{}", self.base_url, payment_id))
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "get payment").await?;

        let payment: GatewayPayment = resp.json().await?;
        Ok(payment)
    }

    /// Verifies the `x-signature` header (`ts=...,v1=...`) against the
    /// documented manifest `id:<data.id>;request-id:<x-request-id>;ts:<ts>;`.
    pub fn verify_webhook_signature(
        &self,
        data_id: &str,
        request_id: &str,
        signature_header: &str,
    ) -> Result<()> {
        let secret = self
            .webhook_secret
            .as_deref()
            .ok_or_else(|| anyhow!("webhook secret is not configured"))?;

        let mut timestamp: Option<String> = None;
        let mut signature: Option<String> = None;

        for part in signature_header.split(',') {
            let part = part.trim();
            if let Some(rest) = part.strip_prefix("ts=") {
                timestamp = Some(rest.to_string());
            } else if let Some(rest) = part.strip_prefix("v1=") {
                signature = Some(rest.to_string());
            }
        }

        let timestamp = timestamp.ok_or_else(|| anyhow!("missing ts in x-signature"))?;
        let signature = signature.ok_or_else(|| anyhow!("missing v1 in x-signature"))?;

        let manifest = format!("id:{data_id};request-id:{request_id};ts:{timestamp};");
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
        mac.update(manifest.as_bytes());
        let expected = mac.finalize().into_bytes();
        let provided = hex::decode(signature)?;

        if expected[..] != provided[..] {
            anyhow::bail!("invalid webhook signature");
        }

        Ok(())
    }
}
