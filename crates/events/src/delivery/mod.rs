//! Web Push delivery.
//!
//! - [`encryption`] -- RFC 8291 `aes128gcm` message encryption.
//! - [`vapid`] -- RFC 8292 application server identification.
//! - [`web_push`] -- the [`web_push::PushGateway`] seam and its HTTP
//!   implementation.

pub mod encryption;
pub mod vapid;
pub mod web_push;
