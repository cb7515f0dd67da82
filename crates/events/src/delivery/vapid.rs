//! VAPID application server identification (RFC 8292).
//!
//! Each push request carries `Authorization: vapid t=<jwt>, k=<key>` where
//! the JWT is ES256-signed over `{ aud, exp, sub }` and `k` is the
//! server's uncompressed P-256 public key, base64url without padding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::SecretKey;
use reqwest::Url;
use serde::Serialize;

use super::web_push::PushError;

/// Token lifetime. RFC 8292 caps `exp` at 24 hours ahead.
pub const TOKEN_TTL_SECS: i64 = 12 * 60 * 60;

#[derive(Serialize)]
struct Claims<'a> {
    aud: &'a str,
    exp: i64,
    sub: &'a str,
}

/// The server's VAPID key pair.
#[derive(Clone)]
pub struct VapidKeys {
    signing_key: SigningKey,
    public_key_b64: String,
}

impl std::fmt::Debug for VapidKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VapidKeys")
            .field("public_key", &self.public_key_b64)
            .finish_non_exhaustive()
    }
}

impl VapidKeys {
    /// Load keys from their base64url forms.
    ///
    /// `private_key` is the raw 32-byte scalar. When `public_key` is given
    /// it must match the key derived from the private key.
    pub fn from_base64(private_key: &str, public_key: Option<&str>) -> Result<Self, PushError> {
        let raw = URL_SAFE_NO_PAD
            .decode(private_key.trim().trim_end_matches('='))
            .map_err(|e| PushError::Vapid(format!("private key is not base64url: {e}")))?;
        let secret = SecretKey::from_slice(&raw)
            .map_err(|_| PushError::Vapid("private key is not a P-256 scalar".into()))?;

        let derived = URL_SAFE_NO_PAD.encode(secret.public_key().to_encoded_point(false).as_bytes());
        if let Some(given) = public_key {
            if given.trim().trim_end_matches('=') != derived {
                return Err(PushError::Vapid(
                    "public key does not match the private key".into(),
                ));
            }
        }

        Ok(Self {
            signing_key: SigningKey::from(secret),
            public_key_b64: derived,
        })
    }

    /// Public key for the browser's `applicationServerKey`.
    pub fn public_key(&self) -> &str {
        &self.public_key_b64
    }

    /// Build the `Authorization` header value for a push endpoint.
    pub fn authorization(&self, endpoint: &str, subject: &str, now: i64) -> Result<String, PushError> {
        let audience = audience_for(endpoint)?;
        let token = self.sign_token(&Claims {
            aud: &audience,
            exp: now + TOKEN_TTL_SECS,
            sub: subject,
        })?;
        Ok(format!("vapid t={token}, k={}", self.public_key_b64))
    }

    fn sign_token(&self, claims: &Claims<'_>) -> Result<String, PushError> {
        let header = URL_SAFE_NO_PAD.encode(br#"{"typ":"JWT","alg":"ES256"}"#);
        let body = serde_json::to_vec(claims)
            .map_err(|e| PushError::Vapid(format!("failed to encode claims: {e}")))?;
        let signing_input = format!("{header}.{}", URL_SAFE_NO_PAD.encode(body));
        let signature: Signature = self.signing_key.sign(signing_input.as_bytes());
        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }
}

/// The JWT audience is the origin of the push service endpoint.
pub fn audience_for(endpoint: &str) -> Result<String, PushError> {
    let url = Url::parse(endpoint)
        .map_err(|e| PushError::InvalidSubscription(format!("endpoint is not a URL: {e}")))?;
    if url.scheme() != "https" {
        return Err(PushError::InvalidSubscription(
            "endpoint must use https".into(),
        ));
    }
    Ok(url.origin().ascii_serialization())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use p256::ecdsa::signature::Verifier;
    use p256::ecdsa::VerifyingKey;

    use super::*;

    const PRIVATE: &str = "yfWPiYE-n46HLnH0KqZOF1fJJU3MYrct3AELtAQ-oRw";

    #[test]
    fn audience_is_the_endpoint_origin() {
        assert_eq!(
            audience_for("https://fcm.googleapis.com/fcm/send/abc:def").unwrap(),
            "https://fcm.googleapis.com"
        );
        assert_matches!(
            audience_for("http://push.example/x"),
            Err(PushError::InvalidSubscription(_))
        );
    }

    #[test]
    fn authorization_header_verifies_with_the_public_key() {
        let keys = VapidKeys::from_base64(PRIVATE, None).unwrap();
        let header = keys
            .authorization("https://updates.push.services.mozilla.com/wpush/v2/x", "mailto:ops@leaders.example", 1_700_000_000)
            .unwrap();

        let rest = header.strip_prefix("vapid t=").unwrap();
        let (token, k) = rest.split_once(", k=").unwrap();
        assert_eq!(k, keys.public_key());

        let mut parts = token.rsplitn(2, '.');
        let signature = URL_SAFE_NO_PAD.decode(parts.next().unwrap()).unwrap();
        let signing_input = parts.next().unwrap();

        let public = URL_SAFE_NO_PAD.decode(k).unwrap();
        let verifier = VerifyingKey::from_sec1_bytes(&public).unwrap();
        let signature = Signature::from_slice(&signature).unwrap();
        verifier.verify(signing_input.as_bytes(), &signature).unwrap();

        let claims_b64 = signing_input.split('.').nth(1).unwrap();
        let claims: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(claims_b64).unwrap()).unwrap();
        assert_eq!(claims["aud"], "https://updates.push.services.mozilla.com");
        assert_eq!(claims["exp"], 1_700_000_000 + TOKEN_TTL_SECS);
        assert_eq!(claims["sub"], "mailto:ops@leaders.example");
    }

    #[test]
    fn mismatched_public_key_is_rejected() {
        let other = VapidKeys::from_base64("q1dXpw3UpT5VOmu_cf_v6ih07Aems3njxI-JWgLcM94", None)
            .unwrap();
        assert_matches!(
            VapidKeys::from_base64(PRIVATE, Some(other.public_key())),
            Err(PushError::Vapid(_))
        );
        let own = VapidKeys::from_base64(PRIVATE, None).unwrap();
        assert!(VapidKeys::from_base64(PRIVATE, Some(own.public_key())).is_ok());
    }

    #[test]
    fn garbage_private_key_is_rejected() {
        assert_matches!(VapidKeys::from_base64("not base64!", None), Err(PushError::Vapid(_)));
        assert_matches!(VapidKeys::from_base64("AAAA", None), Err(PushError::Vapid(_)));
    }
}
