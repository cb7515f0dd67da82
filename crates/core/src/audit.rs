//! Audit log action names and detail redaction.
//!
//! Every state change writes an audit row in the same transaction as the
//! change itself; these constants are the `action` column values.

/// Known action names for audit log entries.
pub mod actions {
    pub const STATUS_CHANGE: &str = "status_change";
    pub const BRAND_PROVISIONED: &str = "brand.provisioned";
    pub const BRAND_VERIFIED: &str = "brand.verified";
    pub const ROLE_GRANTED: &str = "role.granted";
    pub const USER_BLOCKED: &str = "user.blocked";
    pub const USER_UNBLOCKED: &str = "user.unblocked";
    pub const ENTITY_CREATE: &str = "entity_create";
    pub const ENTITY_UPDATE: &str = "entity_update";
    pub const UPLOAD: &str = "upload";
}

/// Entity type names used in audit rows and realtime change events.
pub mod entities {
    pub const USER: &str = "user";
    pub const BRAND: &str = "brand";
    pub const CAMPAIGN: &str = "campaign";
    pub const APPLICATION: &str = "application";
    pub const TASK: &str = "task";
    pub const PAYMENT: &str = "payment";
    pub const SHIPMENT_REQUEST: &str = "shipment_request";
    pub const SHIPMENT: &str = "shipment";
    pub const DISPUTE: &str = "dispute";
}

/// Fields that must never be stored in audit details.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "authorization",
    "private_key",
    "auth",
    "p256dh",
];

/// Redact sensitive fields from a JSON value (recursively).
///
/// Any object key containing one of [`SENSITIVE_FIELDS`] has its value
/// replaced with `"[REDACTED]"`.
pub fn redact_sensitive_fields(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut redacted = serde_json::Map::new();
            for (key, val) in map {
                let lower_key = key.to_lowercase();
                if SENSITIVE_FIELDS.iter().any(|f| lower_key.contains(f)) {
                    redacted.insert(
                        key.clone(),
                        serde_json::Value::String("[REDACTED]".to_string()),
                    );
                } else {
                    redacted.insert(key.clone(), redact_sensitive_fields(val));
                }
            }
            serde_json::Value::Object(redacted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(redact_sensitive_fields).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_secrets_are_redacted() {
        let details = json!({
            "manager_email": "dana@example.com",
            "manager_password": "hunter2hunter2",
            "subscription": { "endpoint": "https://push.example/abc", "auth": "xyz" },
            "grants": [{ "access_token": "t" }]
        });
        let redacted = redact_sensitive_fields(&details);
        assert_eq!(redacted["manager_email"], "dana@example.com");
        assert_eq!(redacted["manager_password"], "[REDACTED]");
        assert_eq!(redacted["subscription"]["endpoint"], "https://push.example/abc");
        assert_eq!(redacted["subscription"]["auth"], "[REDACTED]");
        assert_eq!(redacted["grants"][0]["access_token"], "[REDACTED]");
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(redact_sensitive_fields(&json!(42)), json!(42));
    }
}
