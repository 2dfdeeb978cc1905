//! SMS delivery via an external HTTP gateway.
//!
//! [`HttpSmsGateway`] POSTs a JSON payload to a bearer-token-authenticated
//! provider endpoint. A non-success response surfaces the provider's status
//! and response body in the error, which the dispatcher records (truncated)
//! on the failed record.
//!
//! There is deliberately no retry here: a failed communication is terminal,
//! and re-sending is an explicit new schedule call.

use std::time::Duration;

use async_trait::async_trait;

use super::DeliveryError;

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// SmsGateway trait
// ---------------------------------------------------------------------------

/// Sends an SMS to a patient phone number. Implemented by [`HttpSmsGateway`]
/// in production and by a recording fake in tests.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, phone: &str, body: &str) -> Result<(), DeliveryError>;
}

// ---------------------------------------------------------------------------
// SmsConfig
// ---------------------------------------------------------------------------

/// Configuration for the SMS gateway.
#[derive(Debug, Clone)]
pub struct SmsConfig {
    /// Provider endpoint URL.
    pub gateway_url: String,
    /// Bearer token for the provider API.
    pub api_key: String,
    /// Optional sender id shown to the patient.
    pub sender_id: Option<String>,
}

impl SmsConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` unless both `SMS_GATEWAY_URL` and `SMS_GATEWAY_KEY`
    /// are set, signalling that SMS delivery is not configured.
    ///
    /// | Variable          | Required | Default |
    /// |-------------------|----------|---------|
    /// | `SMS_GATEWAY_URL` | yes      | —       |
    /// | `SMS_GATEWAY_KEY` | yes      | —       |
    /// | `SMS_SENDER_ID`   | no       | —       |
    pub fn from_env() -> Option<Self> {
        let gateway_url = std::env::var("SMS_GATEWAY_URL").ok()?;
        let api_key = std::env::var("SMS_GATEWAY_KEY").ok()?;
        Some(Self {
            gateway_url,
            api_key,
            sender_id: std::env::var("SMS_SENDER_ID").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// HttpSmsGateway
// ---------------------------------------------------------------------------

/// Delivers SMS messages through the configured HTTP provider.
pub struct HttpSmsGateway {
    client: reqwest::Client,
    config: SmsConfig,
}

impl HttpSmsGateway {
    /// Create a new gateway with a pre-configured HTTP client.
    pub fn new(config: SmsConfig) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DeliveryError::Gateway(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    async fn send(&self, phone: &str, body: &str) -> Result<(), DeliveryError> {
        let payload = serde_json::json!({
            "to": phone,
            "message": body,
            "from": self.config.sender_id,
        });

        let response = self
            .client
            .post(&self.config.gateway_url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Gateway(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Gateway(format!(
                "provider returned HTTP {status}: {detail}"
            )));
        }

        tracing::info!(phone, "Patient SMS sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
