//! Web Push wiring for the API.
//!
//! [`PushService`] bundles the dispatcher with the VAPID public key that
//! browsers need for `pushManager.subscribe()`. It only exists when a
//! VAPID private key is configured.

use std::sync::Arc;

use leaders_db::DbPool;
use leaders_events::delivery::vapid::VapidKeys;
use leaders_events::{PgSubscriptionStore, PushDispatcher, PushError, WebPushGateway};

use crate::config::PushConfig;

pub struct PushService {
    pub dispatcher: PushDispatcher,
    pub public_key: String,
}

impl PushService {
    /// Build the service from configuration. Returns `Ok(None)` when no
    /// VAPID private key is set.
    pub fn from_config(config: &PushConfig, pool: DbPool) -> Result<Option<Self>, PushError> {
        let Some(private_key) = config.vapid_private_key.as_deref() else {
            return Ok(None);
        };

        let keys = VapidKeys::from_base64(private_key, config.vapid_public_key.as_deref())?;
        let gateway = WebPushGateway::new(keys, config.subject.clone())?;
        let public_key = gateway.public_key().to_string();

        let dispatcher = PushDispatcher::new(
            Arc::new(PgSubscriptionStore::new(pool)),
            Arc::new(gateway),
        );
        Ok(Some(Self {
            dispatcher,
            public_key,
        }))
    }
}
