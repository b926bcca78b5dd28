//! Signed webhook delivery with exponential-backoff retry.
//!
//! [`WebhookDelivery`] POSTs a JSON-encoded [`ContentEvent`] to an external
//! URL. When a signing secret is configured the raw body is signed with
//! HMAC-SHA256 and the hex digest sent in [`SIGNATURE_HEADER`]. Failed
//! attempts are retried with backoff (1 s, 2 s, 4 s).

use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::bus::ContentEvent;

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

fn default_retry_delays() -> Vec<Duration> {
    RETRY_DELAYS_SECS.iter().copied().map(Duration::from_secs).collect()
}

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying the hex HMAC-SHA256 of the request body.
pub const SIGNATURE_HEADER: &str = "X-Pressroom-Signature";

/// Header carrying the event kind, for routing without parsing the body.
pub const EVENT_HEADER: &str = "X-Pressroom-Event";

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Failed to encode webhook body: {0}")]
    Encode(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// Compute the hex-encoded HMAC-SHA256 of `body` under `secret`.
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }
}

// ---------------------------------------------------------------------------
// WebhookDelivery
// ---------------------------------------------------------------------------

/// Delivers content events to external webhook endpoints.
#[derive(Clone)]
pub struct WebhookDelivery {
    client: reqwest::Client,
    secret: Option<String>,
    retry_delays: Vec<Duration>,
}

impl WebhookDelivery {
    /// Create a delivery service with a pre-configured HTTP client.
    pub fn new(secret: Option<String>) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            secret,
            retry_delays: default_retry_delays(),
        })
    }

    /// Replace the backoff schedule. One retry is made per delay.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    /// The exact JSON body sent for `event`.
    pub fn encode(event: &ContentEvent) -> Result<Vec<u8>, WebhookError> {
        let body = serde_json::json!({
            "event": event.kind,
            "data": event.body(),
            "actorUserId": event.actor_user_id,
            "timestamp": event.timestamp,
        });
        Ok(serde_json::to_vec(&body)?)
    }

    /// Deliver an event to a webhook URL with retry.
    ///
    /// Returns `Ok(())` on the first successful attempt, or the error of the
    /// final attempt once every retry is spent.
    pub async fn deliver(&self, url: &str, event: &ContentEvent) -> Result<(), WebhookError> {
        let body = Self::encode(event)?;
        let signature = self.secret.as_deref().map(|s| sign_payload(s, &body));

        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match self.try_send(url, event, &body, signature.as_deref()).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            let Some(delay) = self.retry_delays.get(attempt - 1) else {
                tracing::error!(
                    attempts = attempt,
                    url,
                    error = %err,
                    "Webhook delivery failed after all retries"
                );
                return Err(err);
            };
            tracing::warn!(
                attempt,
                url,
                error = %err,
                "Webhook delivery attempt failed, retrying"
            );
            tokio::time::sleep(*delay).await;
        }
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(
        &self,
        url: &str,
        event: &ContentEvent,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<(), WebhookError> {
        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(EVENT_HEADER, event.kind.as_str())
            .body(body.to_vec());
        if let Some(signature) = signature {
            request = request.header(SIGNATURE_HEADER, signature);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}
