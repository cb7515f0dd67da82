//! Message encryption for Web Push (RFC 8291, `aes128gcm` of RFC 8188).
//!
//! The body of a push request is a single record:
//!
//! ```text
//! salt (16) | record size (u32 BE) | key id length (1) | server public key (65) | ciphertext
//! ```
//!
//! The content key and nonce are derived with HKDF-SHA256 from an ECDH
//! agreement between a fresh server key pair and the browser's `p256dh`
//! key, mixed with the browser's 16-byte `auth` secret.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Nonce};
use hkdf::Hkdf;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use sha2::Sha256;

use super::web_push::PushError;

/// Record size advertised in the header. One record carries the whole message.
pub const RECORD_SIZE: u32 = 4096;

/// Length of an uncompressed P-256 point.
pub const PUBLIC_KEY_LEN: usize = 65;

pub const SALT_LEN: usize = 16;

pub const AUTH_SECRET_LEN: usize = 16;

/// AES-GCM tag length.
const TAG_LEN: usize = 16;

/// Header length: salt, record size, key id length, key id.
pub const HEADER_LEN: usize = SALT_LEN + 4 + 1 + PUBLIC_KEY_LEN;

/// Largest payload whose encrypted body stays within the push service cap.
pub const MAX_PAYLOAD_LEN: usize = leaders_core::push::MAX_PAYLOAD_BYTES;

/// Padding delimiter for the last (only) record.
const LAST_RECORD_DELIMITER: u8 = 0x02;

/// Encrypt `payload` for a browser subscription with a fresh key pair and salt.
pub fn encrypt(
    ua_public: &[u8],
    auth_secret: &[u8],
    payload: &[u8],
) -> Result<Vec<u8>, PushError> {
    let server_secret = SecretKey::random(&mut OsRng);
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    encrypt_with(ua_public, auth_secret, payload, &server_secret, &salt)
}

/// Encrypt with an explicit server key and salt.
pub fn encrypt_with(
    ua_public: &[u8],
    auth_secret: &[u8],
    payload: &[u8],
    server_secret: &SecretKey,
    salt: &[u8; SALT_LEN],
) -> Result<Vec<u8>, PushError> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(PushError::PayloadTooLarge(payload.len()));
    }
    if auth_secret.len() != AUTH_SECRET_LEN {
        return Err(PushError::InvalidSubscription(format!(
            "auth secret must be {AUTH_SECRET_LEN} bytes, got {}",
            auth_secret.len()
        )));
    }
    let ua_key = PublicKey::from_sec1_bytes(ua_public)
        .map_err(|_| PushError::InvalidSubscription("p256dh is not a P-256 point".into()))?;
    let ua_point = ua_key.to_encoded_point(false);
    let as_point = server_secret.public_key().to_encoded_point(false);

    let shared = p256::ecdh::diffie_hellman(server_secret.to_nonzero_scalar(), ua_key.as_affine());
    let (cek, nonce) = derive_key_and_nonce(
        shared.raw_secret_bytes(),
        auth_secret,
        ua_point.as_bytes(),
        as_point.as_bytes(),
        salt,
    )?;

    let mut plaintext = Vec::with_capacity(payload.len() + 1);
    plaintext.extend_from_slice(payload);
    plaintext.push(LAST_RECORD_DELIMITER);

    let cipher = Aes128Gcm::new_from_slice(&cek)
        .map_err(|_| PushError::Encryption("invalid content encryption key".into()))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
        .map_err(|_| PushError::Encryption("AES-GCM encryption failed".into()))?;

    let mut body = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    body.extend_from_slice(salt);
    body.extend_from_slice(&RECORD_SIZE.to_be_bytes());
    body.push(PUBLIC_KEY_LEN as u8);
    body.extend_from_slice(as_point.as_bytes());
    body.extend_from_slice(&ciphertext);
    Ok(body)
}

/// Derive the 16-byte content encryption key and 12-byte nonce.
pub(crate) fn derive_key_and_nonce(
    ecdh_secret: &[u8],
    auth_secret: &[u8],
    ua_public: &[u8],
    as_public: &[u8],
    salt: &[u8],
) -> Result<([u8; 16], [u8; 12]), PushError> {
    let mut key_info = Vec::with_capacity(14 + ua_public.len() + as_public.len());
    key_info.extend_from_slice(b"WebPush: info\0");
    key_info.extend_from_slice(ua_public);
    key_info.extend_from_slice(as_public);

    let mut ikm = [0u8; 32];
    Hkdf::<Sha256>::new(Some(auth_secret), ecdh_secret)
        .expand(&key_info, &mut ikm)
        .map_err(|_| PushError::Encryption("HKDF expand failed for IKM".into()))?;

    let hk = Hkdf::<Sha256>::new(Some(salt), &ikm);
    let mut cek = [0u8; 16];
    hk.expand(b"Content-Encoding: aes128gcm\0", &mut cek)
        .map_err(|_| PushError::Encryption("HKDF expand failed for CEK".into()))?;
    let mut nonce = [0u8; 12];
    hk.expand(b"Content-Encoding: nonce\0", &mut nonce)
        .map_err(|_| PushError::Encryption("HKDF expand failed for nonce".into()))?;

    Ok((cek, nonce))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    use super::*;

    /// Browser-side decryption, as a service worker's push service would do.
    fn decrypt(body: &[u8], ua_secret: &SecretKey, auth_secret: &[u8]) -> Vec<u8> {
        let salt = &body[..SALT_LEN];
        let rs = u32::from_be_bytes(body[SALT_LEN..SALT_LEN + 4].try_into().unwrap());
        assert_eq!(rs, RECORD_SIZE);
        let id_len = body[SALT_LEN + 4] as usize;
        let as_public = &body[SALT_LEN + 5..SALT_LEN + 5 + id_len];
        let ciphertext = &body[SALT_LEN + 5 + id_len..];

        let as_key = PublicKey::from_sec1_bytes(as_public).unwrap();
        let shared = p256::ecdh::diffie_hellman(ua_secret.to_nonzero_scalar(), as_key.as_affine());
        let ua_public = ua_secret.public_key().to_encoded_point(false);
        let (cek, nonce) = derive_key_and_nonce(
            shared.raw_secret_bytes(),
            auth_secret,
            ua_public.as_bytes(),
            as_public,
            salt,
        )
        .unwrap();

        let mut plain = Aes128Gcm::new_from_slice(&cek)
            .unwrap()
            .decrypt(Nonce::from_slice(&nonce), ciphertext)
            .unwrap();
        assert_eq!(plain.pop(), Some(LAST_RECORD_DELIMITER));
        plain
    }

    // Key material from RFC 8291 Appendix A.
    const UA_PRIVATE: &str = "q1dXpw3UpT5VOmu_cf_v6ih07Aems3njxI-JWgLcM94";
    const AS_PRIVATE: &str = "yfWPiYE-n46HLnH0KqZOF1fJJU3MYrct3AELtAQ-oRw";
    const AUTH_SECRET: &str = "BTBZMqHH6r4Tts7J_aSIgg";
    const SALT: &str = "DGv6ra1nlYgDCS1FRnbzlw";

    fn key(b64: &str) -> SecretKey {
        SecretKey::from_slice(&URL_SAFE_NO_PAD.decode(b64).unwrap()).unwrap()
    }

    #[test]
    fn browser_can_decrypt_the_message() {
        let ua_secret = key(UA_PRIVATE);
        let ua_public = ua_secret.public_key().to_encoded_point(false);
        let auth = URL_SAFE_NO_PAD.decode(AUTH_SECRET).unwrap();
        let salt: [u8; SALT_LEN] = URL_SAFE_NO_PAD.decode(SALT).unwrap().try_into().unwrap();
        let payload = b"When I grow up, I want to be a watermelon";

        let body = encrypt_with(ua_public.as_bytes(), &auth, payload, &key(AS_PRIVATE), &salt)
            .unwrap();

        assert_eq!(&body[..SALT_LEN], &salt);
        assert_eq!(body[SALT_LEN + 4] as usize, PUBLIC_KEY_LEN);
        // Ciphertext is the payload plus delimiter plus the GCM tag.
        assert_eq!(body.len(), HEADER_LEN + payload.len() + 1 + TAG_LEN);
        assert_eq!(decrypt(&body, &ua_secret, &auth), payload);
    }

    #[test]
    fn fresh_keys_and_salt_per_message() {
        let ua_secret = key(UA_PRIVATE);
        let ua_public = ua_secret.public_key().to_encoded_point(false);
        let auth = URL_SAFE_NO_PAD.decode(AUTH_SECRET).unwrap();

        let a = encrypt(ua_public.as_bytes(), &auth, b"{}").unwrap();
        let b = encrypt(ua_public.as_bytes(), &auth, b"{}").unwrap();
        assert_ne!(a[..HEADER_LEN], b[..HEADER_LEN]);
        assert_eq!(decrypt(&a, &ua_secret, &auth), b"{}");
    }

    #[test]
    fn rejects_bad_subscription_keys() {
        let auth = [0u8; AUTH_SECRET_LEN];
        assert_matches!(
            encrypt(&[4u8; PUBLIC_KEY_LEN], &auth, b"hi"),
            Err(PushError::InvalidSubscription(_))
        );

        let ua_public = key(UA_PRIVATE).public_key().to_encoded_point(false);
        assert_matches!(
            encrypt(ua_public.as_bytes(), &[0u8; 8], b"hi"),
            Err(PushError::InvalidSubscription(_))
        );
    }

    #[test]
    fn largest_payload_fills_exactly_one_push_body() {
        let ua_public = key(UA_PRIVATE).public_key().to_encoded_point(false);
        let payload = vec![b'x'; MAX_PAYLOAD_LEN];
        let body = encrypt(ua_public.as_bytes(), &[0u8; AUTH_SECRET_LEN], &payload).unwrap();
        assert_eq!(body.len(), leaders_core::push::MAX_PUSH_BODY_BYTES);
        assert_eq!(HEADER_LEN + TAG_LEN + 1, leaders_core::push::ENCRYPTION_OVERHEAD_BYTES);
    }

    #[test]
    fn rejects_oversized_payload() {
        let ua_public = key(UA_PRIVATE).public_key().to_encoded_point(false);
        let payload = vec![b'x'; MAX_PAYLOAD_LEN + 1];
        assert_matches!(
            encrypt(ua_public.as_bytes(), &[0u8; AUTH_SECRET_LEN], &payload),
            Err(PushError::PayloadTooLarge(_))
        );
    }
}
