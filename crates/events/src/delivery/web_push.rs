//! Web Push HTTP delivery.
//!
//! [`PushGateway`] is the seam between the dispatcher and the network;
//! [`WebPushGateway`] is the production implementation that encrypts the
//! payload, signs a VAPID header and POSTs to the subscription endpoint.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use leaders_db::models::push_subscription::PushSubscription;

use super::encryption;
use super::vapid::VapidKeys;

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How long the push service should hold an undelivered message.
pub const DEFAULT_TTL_SECS: u32 = 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for push delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The push service no longer knows the subscription (404 or 410).
    /// The subscription must be deleted and never retried.
    #[error("Subscription gone (HTTP {0})")]
    Gone(u16),

    /// The push service returned another non-2xx status code.
    #[error("Push service returned HTTP {0}")]
    HttpStatus(u16),

    /// Stored subscription keys or endpoint are unusable.
    #[error("Invalid subscription: {0}")]
    InvalidSubscription(String),

    #[error("Payload of {0} bytes does not fit in one push record")]
    PayloadTooLarge(usize),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("VAPID error: {0}")]
    Vapid(String),
}

impl PushError {
    /// Whether the subscription should be removed.
    pub fn is_gone(&self) -> bool {
        matches!(self, PushError::Gone(_))
    }
}

// ---------------------------------------------------------------------------
// Gateway seam
// ---------------------------------------------------------------------------

/// Destination of one push message.
#[derive(Debug, Clone)]
pub struct PushTarget {
    pub endpoint: String,
    /// Browser public key, base64url.
    pub p256dh: String,
    /// Browser auth secret, base64url.
    pub auth: String,
}

impl From<&PushSubscription> for PushTarget {
    fn from(sub: &PushSubscription) -> Self {
        Self {
            endpoint: sub.endpoint.clone(),
            p256dh: sub.p256dh.clone(),
            auth: sub.auth.clone(),
        }
    }
}

/// Sends one encrypted message to one subscription.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, target: &PushTarget, payload: &[u8]) -> Result<(), PushError>;
}

// ---------------------------------------------------------------------------
// WebPushGateway
// ---------------------------------------------------------------------------

/// Delivers push messages to browser push services over HTTPS.
pub struct WebPushGateway {
    client: reqwest::Client,
    keys: VapidKeys,
    subject: String,
    ttl_secs: u32,
}

impl WebPushGateway {
    /// Create a gateway with a pre-configured HTTP client.
    pub fn new(keys: VapidKeys, subject: impl Into<String>) -> Result<Self, PushError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            keys,
            subject: subject.into(),
            ttl_secs: DEFAULT_TTL_SECS,
        })
    }

    pub fn public_key(&self) -> &str {
        self.keys.public_key()
    }
}

#[async_trait]
impl PushGateway for WebPushGateway {
    async fn send(&self, target: &PushTarget, payload: &[u8]) -> Result<(), PushError> {
        let ua_public = decode_key(&target.p256dh, "p256dh")?;
        let auth = decode_key(&target.auth, "auth")?;
        let body = encryption::encrypt(&ua_public, &auth, payload)?;
        let authorization =
            self.keys
                .authorization(&target.endpoint, &self.subject, chrono::Utc::now().timestamp())?;

        let response = self
            .client
            .post(&target.endpoint)
            .header("Content-Encoding", "aes128gcm")
            .header("Content-Type", "application/octet-stream")
            .header("TTL", self.ttl_secs.to_string())
            .header("Urgency", "normal")
            .header("Authorization", authorization)
            .body(body)
            .send()
            .await?;

        classify_status(response.status().as_u16())
    }
}

/// Map a push service response status to a delivery result.
pub fn classify_status(status: u16) -> Result<(), PushError> {
    match status {
        200..=299 => Ok(()),
        404 | 410 => Err(PushError::Gone(status)),
        other => Err(PushError::HttpStatus(other)),
    }
}

fn decode_key(value: &str, field: &str) -> Result<Vec<u8>, PushError> {
    URL_SAFE_NO_PAD
        .decode(value.trim().trim_end_matches('='))
        .map_err(|_| PushError::InvalidSubscription(format!("{field} is not base64url")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn gone_statuses_are_distinguished() {
        assert!(classify_status(201).is_ok());
        assert_matches!(classify_status(404), Err(PushError::Gone(404)));
        assert_matches!(classify_status(410), Err(PushError::Gone(410)));
        assert_matches!(classify_status(429), Err(PushError::HttpStatus(429)));
        assert!(classify_status(410).unwrap_err().is_gone());
        assert!(!classify_status(500).unwrap_err().is_gone());
    }

    #[test]
    fn push_error_display() {
        assert_eq!(PushError::Gone(410).to_string(), "Subscription gone (HTTP 410)");
        assert_eq!(
            PushError::HttpStatus(502).to_string(),
            "Push service returned HTTP 502"
        );
    }

    #[test]
    fn padded_keys_are_accepted() {
        assert_eq!(decode_key("AQI=", "auth").unwrap(), vec![1, 2]);
        assert_matches!(decode_key("***", "auth"), Err(PushError::InvalidSubscription(_)));
    }

    #[tokio::test]
    async fn malformed_subscription_fails_before_any_request() {
        let keys = VapidKeys::from_base64("yfWPiYE-n46HLnH0KqZOF1fJJU3MYrct3AELtAQ-oRw", None).unwrap();
        let gateway = WebPushGateway::new(keys, "mailto:ops@leaders.example").unwrap();
        let target = PushTarget {
            endpoint: "https://push.example/sub".into(),
            p256dh: "AAAA".into(),
            auth: "AAAAAAAAAAAAAAAAAAAAAA".into(),
        };
        assert_matches!(
            gateway.send(&target, b"{}").await,
            Err(PushError::InvalidSubscription(_))
        );
    }
}
