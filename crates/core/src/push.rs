//! Push notification payload rules.
//!
//! The payload delivered to the browser service worker is
//! `{ "title", "body", "url" }`; the worker opens `url` (always a
//! same-origin relative path) when the notification is clicked.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::roles::{ROLE_ADMIN, ROLE_BRAND_MANAGER, ROLE_BRAND_USER, ROLE_CONTENT_OPS, ROLE_SUPPORT};

/// Roles allowed to send push notifications to other users.
pub const SENDER_ROLES: &[&str] = &[
    ROLE_ADMIN,
    ROLE_SUPPORT,
    ROLE_CONTENT_OPS,
    ROLE_BRAND_MANAGER,
    ROLE_BRAND_USER,
];

pub const MAX_TITLE_CHARS: usize = 120;
pub const MAX_BODY_CHARS: usize = 500;
pub const MAX_URL_CHARS: usize = 2048;

/// Push services reject request bodies larger than this.
pub const MAX_PUSH_BODY_BYTES: usize = 4096;
/// `aes128gcm` overhead: 86-byte header, 16-byte tag, 1-byte delimiter.
pub const ENCRYPTION_OVERHEAD_BYTES: usize = 86 + 16 + 1;
/// Largest serialized payload that still fits one encrypted push body.
pub const MAX_PAYLOAD_BYTES: usize = MAX_PUSH_BODY_BYTES - ENCRYPTION_OVERHEAD_BYTES;

/// Default per-caller send limit.
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 20;
/// Default sliding window for the send limit.
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

pub fn may_send(role: &str) -> bool {
    SENDER_ROLES.contains(&role)
}

/// Raw request body of `POST /push/send`.
///
/// `user_id` stays a string so that a malformed id is reported as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct SendRequest {
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default = "default_url")]
    pub url: String,
}

fn default_url() -> String {
    "/".to_string()
}

/// A validated notification ready for fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub url: String,
}

impl PushMessage {
    /// JSON bytes handed to the service worker.
    pub fn to_payload(&self) -> Vec<u8> {
        // Serializing a struct of three strings cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// Validate a send request, returning the recipient and the message.
pub fn validate_send_request(req: &SendRequest) -> Result<(Uuid, PushMessage), CoreError> {
    let recipient = Uuid::parse_str(req.user_id.trim())
        .map_err(|_| CoreError::Validation("user_id must be a valid UUID".into()))?;

    let title = req.title.trim();
    if title.is_empty() {
        return Err(CoreError::Validation("title must not be empty".into()));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(CoreError::Validation(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }

    if req.body.chars().count() > MAX_BODY_CHARS {
        return Err(CoreError::Validation(format!(
            "body must be at most {MAX_BODY_CHARS} characters"
        )));
    }

    validate_relative_url(&req.url)?;

    let message = PushMessage {
        title: title.to_string(),
        body: req.body.clone(),
        url: req.url.clone(),
    };
    let size = message.to_payload().len();
    if size > MAX_PAYLOAD_BYTES {
        return Err(CoreError::Validation(format!(
            "notification is {size} bytes encoded, at most {MAX_PAYLOAD_BYTES} allowed"
        )));
    }
    Ok((recipient, message))
}

/// Accept only same-origin relative paths (`/campaigns/1`), never
/// protocol-relative (`//evil.example`) or absolute URLs.
pub fn validate_relative_url(url: &str) -> Result<(), CoreError> {
    if url.len() > MAX_URL_CHARS {
        return Err(CoreError::Validation(format!(
            "url must be at most {MAX_URL_CHARS} characters"
        )));
    }
    if !url.starts_with('/') || url.starts_with("//") || url.starts_with("/\\") {
        return Err(CoreError::Validation(
            "url must be a relative path starting with '/'".into(),
        ));
    }
    if url.chars().any(char::is_control) {
        return Err(CoreError::Validation(
            "url must not contain control characters".into(),
        ));
    }
    Ok(())
}
