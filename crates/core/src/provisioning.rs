//! Input rules for admin-initiated brand provisioning.
//!
//! Provisioning creates the manager's identity, profile, the brand, and
//! both membership rows in one transaction (see `leaders_db`). This module
//! only normalises and validates the request.

use serde::Deserialize;
use sha2::{Digest, Sha256};
use validator::Validate;

use crate::error::CoreError;

/// Minimum password length for newly provisioned identities.
pub const MIN_PASSWORD_LENGTH: usize = 12;

/// Maximum accepted length of an idempotency key.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// Request body for `POST /admin/create-brand`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBrandRequest {
    #[validate(length(min = 1, max = 120, message = "brand name must be 1-120 characters"))]
    pub brand_name: String,
    #[validate(length(max = 80, message = "industry must be at most 80 characters"))]
    pub industry: Option<String>,
    #[validate(url(message = "website must be an absolute URL"))]
    pub website: Option<String>,
    #[validate(length(min = 1, max = 120, message = "manager name must be 1-120 characters"))]
    pub manager_name: String,
    #[validate(email(message = "manager email is not a valid address"))]
    pub manager_email: String,
    #[validate(length(min = 12, message = "password must be at least 12 characters"))]
    pub manager_password: String,
}

/// A request that passed validation, with normalised fields.
#[derive(Debug, Clone)]
pub struct BrandProvisioning {
    pub brand_name: String,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub manager_name: String,
    pub manager_email: String,
    pub manager_password: String,
}

impl CreateBrandRequest {
    /// Trim and lower-case where appropriate, then validate.
    pub fn into_provisioning(self) -> Result<BrandProvisioning, CoreError> {
        let normalised = CreateBrandRequest {
            brand_name: self.brand_name.trim().to_string(),
            industry: non_empty(self.industry),
            website: non_empty(self.website),
            manager_name: self.manager_name.trim().to_string(),
            manager_email: self.manager_email.trim().to_lowercase(),
            manager_password: self.manager_password,
        };

        normalised
            .validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;

        if let Some(website) = &normalised.website {
            if !(website.starts_with("https://") || website.starts_with("http://")) {
                return Err(CoreError::Validation(
                    "website must use http or https".into(),
                ));
            }
        }

        Ok(BrandProvisioning {
            brand_name: normalised.brand_name,
            industry: normalised.industry,
            website: normalised.website,
            manager_name: normalised.manager_name,
            manager_email: normalised.manager_email,
            manager_password: normalised.manager_password,
        })
    }
}

impl BrandProvisioning {
    /// SHA-256 hex digest of the normalised request, stored beside an
    /// idempotency key so a replay with a different body can be refused.
    ///
    /// The password is left out.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [
            Some(self.brand_name.as_str()),
            self.industry.as_deref(),
            self.website.as_deref(),
            Some(self.manager_name.as_str()),
            Some(self.manager_email.as_str()),
        ] {
            match field {
                Some(value) => {
                    hasher.update([1u8]);
                    hasher.update((value.len() as u64).to_be_bytes());
                    hasher.update(value.as_bytes());
                }
                None => hasher.update([0u8]),
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Validate a caller-supplied idempotency key.
pub fn validate_idempotency_key(key: &str) -> Result<(), CoreError> {
    if key.is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(CoreError::Validation(format!(
            "Idempotency-Key must be 1-{MAX_IDEMPOTENCY_KEY_LEN} characters"
        )));
    }
    if !key.chars().all(|c| c.is_ascii_graphic()) {
        return Err(CoreError::Validation(
            "Idempotency-Key must be printable ASCII".into(),
        ));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn request() -> CreateBrandRequest {
        CreateBrandRequest {
            brand_name: "  Glow Labs ".into(),
            industry: Some("Beauty".into()),
            website: Some("https://glowlabs.example".into()),
            manager_name: "Dana Reyes".into(),
            manager_email: " Dana@GlowLabs.example ".into(),
            manager_password: "correct-horse-battery".into(),
        }
    }

    #[test]
    fn valid_request_is_normalised() {
        let p = request().into_provisioning().unwrap();
        assert_eq!(p.brand_name, "Glow Labs");
        assert_eq!(p.manager_email, "dana@glowlabs.example");
    }

    #[test]
    fn blank_optional_fields_become_none() {
        let mut req = request();
        req.industry = Some("   ".into());
        req.website = Some(String::new());
        let p = req.into_provisioning().unwrap();
        assert!(p.industry.is_none());
        assert!(p.website.is_none());
    }

    #[test]
    fn short_password_is_rejected() {
        let mut req = request();
        req.manager_password = "short".into();
        assert_matches!(req.into_provisioning(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn bad_email_is_rejected() {
        let mut req = request();
        req.manager_email = "not-an-email".into();
        assert_matches!(req.into_provisioning(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn non_http_website_is_rejected() {
        let mut req = request();
        req.website = Some("ftp://glowlabs.example".into());
        assert_matches!(req.into_provisioning(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn fingerprint_ignores_formatting_but_not_content() {
        let a = request().into_provisioning().unwrap();
        let mut spaced = request();
        spaced.brand_name = "Glow Labs".into();
        spaced.manager_email = "DANA@glowlabs.example".into();
        let b = spaced.into_provisioning().unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut other = request();
        other.brand_name = "Glow Labs EU".into();
        assert_ne!(a.fingerprint(), other.into_provisioning().unwrap().fingerprint());

        let mut no_industry = request();
        no_industry.industry = None;
        assert_ne!(a.fingerprint(), no_industry.into_provisioning().unwrap().fingerprint());
    }

    #[test]
    fn idempotency_key_rules() {
        assert!(validate_idempotency_key("brand-2026-10-16-001").is_ok());
        assert!(validate_idempotency_key("").is_err());
        assert!(validate_idempotency_key("has space").is_err());
        assert!(validate_idempotency_key(&"k".repeat(129)).is_err());
    }
}
