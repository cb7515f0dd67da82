//! Push notification fan-out.
//!
//! [`PushDispatcher`] delivers one [`PushMessage`] to every browser
//! subscription of a recipient:
//!
//! 1. If the recipient saved preferences without the `push` channel,
//!    nothing is sent (`sent: 0`) and the push service is never contacted.
//!    No preference row means push is enabled.
//! 2. Each subscription gets its own encrypted message.
//! 3. Subscriptions reported gone (404/410) are deleted and not retried.
//!    Other failures, and gone subscriptions that could not be deleted,
//!    are counted as `failed` and logged.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use leaders_core::channels::CHANNEL_PUSH;
use leaders_core::push::PushMessage;
use leaders_core::types::DbId;
use leaders_db::models::push_subscription::PushSubscription;
use leaders_db::repositories::{NotificationPreferenceRepo, PushSubscriptionRepo};
use serde::Serialize;
use sqlx::PgPool;

use crate::delivery::web_push::{PushError, PushGateway, PushTarget};

/// Maximum concurrent requests to push services for one dispatch.
const MAX_CONCURRENT_SENDS: usize = 8;

// ---------------------------------------------------------------------------
// Subscription store seam
// ---------------------------------------------------------------------------

/// Read and prune access to a recipient's push state.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Whether the recipient accepts the `push` channel.
    async fn push_enabled(&self, user_id: DbId) -> Result<bool, sqlx::Error>;

    async fn subscriptions(&self, user_id: DbId) -> Result<Vec<PushSubscription>, sqlx::Error>;

    async fn remove(&self, subscription_id: DbId) -> Result<(), sqlx::Error>;
}

/// [`SubscriptionStore`] over the Postgres repositories.
pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn push_enabled(&self, user_id: DbId) -> Result<bool, sqlx::Error> {
        let preference = NotificationPreferenceRepo::find(&self.pool, user_id).await?;
        Ok(preference.map_or(true, |p| p.allows(CHANNEL_PUSH)))
    }

    async fn subscriptions(&self, user_id: DbId) -> Result<Vec<PushSubscription>, sqlx::Error> {
        PushSubscriptionRepo::list_for_user(&self.pool, user_id).await
    }

    async fn remove(&self, subscription_id: DbId) -> Result<(), sqlx::Error> {
        PushSubscriptionRepo::delete(&self.pool, subscription_id).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Per-dispatch delivery counts, returned to the caller as-is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub sent: usize,
    pub removed: usize,
    pub failed: usize,
}

pub struct PushDispatcher {
    store: Arc<dyn SubscriptionStore>,
    gateway: Arc<dyn PushGateway>,
}

impl PushDispatcher {
    pub fn new(store: Arc<dyn SubscriptionStore>, gateway: Arc<dyn PushGateway>) -> Self {
        Self { store, gateway }
    }

    /// Deliver `message` to every subscription of `recipient`.
    pub async fn dispatch(
        &self,
        recipient: DbId,
        message: &PushMessage,
    ) -> Result<DispatchReport, sqlx::Error> {
        if !self.store.push_enabled(recipient).await? {
            tracing::debug!(%recipient, "Recipient has push disabled, skipping");
            return Ok(DispatchReport::default());
        }

        let subscriptions = self.store.subscriptions(recipient).await?;
        if subscriptions.is_empty() {
            return Ok(DispatchReport::default());
        }

        let payload = message.to_payload();
        let results: Vec<(DbId, Result<(), PushError>)> = stream::iter(subscriptions)
            .map(|sub| {
                let payload = &payload;
                async move {
                    let result = self.gateway.send(&PushTarget::from(&sub), payload).await;
                    (sub.id, result)
                }
            })
            .buffer_unordered(MAX_CONCURRENT_SENDS)
            .collect()
            .await;

        let mut report = DispatchReport::default();
        for (subscription_id, result) in results {
            match result {
                Ok(()) => report.sent += 1,
                Err(e) if e.is_gone() => {
                    tracing::info!(%subscription_id, error = %e, "Removing expired push subscription");
                    match self.store.remove(subscription_id).await {
                        Ok(()) => report.removed += 1,
                        Err(db_err) => {
                            tracing::warn!(
                                %subscription_id,
                                error = %db_err,
                                "Failed to remove expired push subscription",
                            );
                            report.failed += 1;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(%subscription_id, error = %e, "Push delivery failed");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            %recipient,
            sent = report.sent,
            removed = report.removed,
            failed = report.failed,
            "Push dispatch complete",
        );
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        push_enabled: bool,
        subs: Mutex<Vec<PushSubscription>>,
        removed: Mutex<Vec<DbId>>,
        remove_attempts: Mutex<usize>,
        fail_removes: bool,
    }

    impl MemoryStore {
        fn with(push_enabled: bool, endpoints: &[&str], user: DbId) -> Self {
            let subs = endpoints
                .iter()
                .map(|endpoint| PushSubscription {
                    id: DbId::new_v4(),
                    user_id: user,
                    endpoint: endpoint.to_string(),
                    p256dh: "key".into(),
                    auth: "auth".into(),
                    created_at: chrono::Utc::now(),
                })
                .collect();
            Self {
                push_enabled,
                subs: Mutex::new(subs),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl SubscriptionStore for MemoryStore {
        async fn push_enabled(&self, _user_id: DbId) -> Result<bool, sqlx::Error> {
            Ok(self.push_enabled)
        }

        async fn subscriptions(&self, user_id: DbId) -> Result<Vec<PushSubscription>, sqlx::Error> {
            let subs = self.subs.lock().unwrap();
            Ok(subs.iter().filter(|s| s.user_id == user_id).cloned().collect())
        }

        async fn remove(&self, subscription_id: DbId) -> Result<(), sqlx::Error> {
            *self.remove_attempts.lock().unwrap() += 1;
            if self.fail_removes {
                return Err(sqlx::Error::PoolTimedOut);
            }
            self.subs.lock().unwrap().retain(|s| s.id != subscription_id);
            self.removed.lock().unwrap().push(subscription_id);
            Ok(())
        }
    }

    /// Answers each endpoint with a fixed status and counts calls.
    #[derive(Default)]
    struct ScriptedGateway {
        statuses: HashMap<String, u16>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PushGateway for ScriptedGateway {
        async fn send(&self, target: &PushTarget, _payload: &[u8]) -> Result<(), PushError> {
            self.calls.lock().unwrap().push(target.endpoint.clone());
            let status = self.statuses.get(&target.endpoint).copied().unwrap_or(201);
            crate::delivery::web_push::classify_status(status)
        }
    }

    fn message() -> PushMessage {
        PushMessage {
            title: "Task approved".into(),
            body: "Your reel was approved".into(),
            url: "/tasks".into(),
        }
    }

    #[tokio::test]
    async fn opted_out_recipient_gets_nothing_and_gateway_is_not_called() {
        let user = DbId::new_v4();
        let store = Arc::new(MemoryStore::with(false, &["https://push.example/a"], user));
        let gateway = Arc::new(ScriptedGateway::default());
        let dispatcher = PushDispatcher::new(store, gateway.clone());

        let report = dispatcher.dispatch(user, &message()).await.unwrap();

        assert_eq!(report, DispatchReport::default());
        assert!(gateway.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn gone_subscription_is_deleted_and_not_retried() {
        let user = DbId::new_v4();
        let store = Arc::new(MemoryStore::with(
            true,
            &["https://push.example/live", "https://push.example/dead"],
            user,
        ));
        let gateway = Arc::new(ScriptedGateway {
            statuses: HashMap::from([("https://push.example/dead".to_string(), 410)]),
            ..Default::default()
        });
        let dispatcher = PushDispatcher::new(store.clone(), gateway.clone());

        let first = dispatcher.dispatch(user, &message()).await.unwrap();
        assert_eq!(
            first,
            DispatchReport {
                sent: 1,
                removed: 1,
                failed: 0
            }
        );
        assert_eq!(store.removed.lock().unwrap().len(), 1);

        // The dead endpoint is never contacted again.
        dispatcher.dispatch(user, &message()).await.unwrap();
        let calls = gateway.calls.lock().unwrap();
        let dead_calls = calls.iter().filter(|e| e.ends_with("/dead")).count();
        assert_eq!(dead_calls, 1);
        assert_eq!(calls.len(), 3);
    }

    #[tokio::test]
    async fn other_failures_are_counted_but_kept() {
        let user = DbId::new_v4();
        let store = Arc::new(MemoryStore::with(true, &["https://push.example/busy"], user));
        let gateway = Arc::new(ScriptedGateway {
            statuses: HashMap::from([("https://push.example/busy".to_string(), 503)]),
            ..Default::default()
        });
        let dispatcher = PushDispatcher::new(store.clone(), gateway);

        let report = dispatcher.dispatch(user, &message()).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.removed, 0);
        assert_eq!(store.subs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_delete_is_counted_and_dispatch_still_reports() {
        let user = DbId::new_v4();
        let store = Arc::new(MemoryStore {
            fail_removes: true,
            ..MemoryStore::with(
                true,
                &[
                    "https://push.example/live",
                    "https://push.example/dead-1",
                    "https://push.example/dead-2",
                ],
                user,
            )
        });
        let gateway = Arc::new(ScriptedGateway {
            statuses: HashMap::from([
                ("https://push.example/dead-1".to_string(), 410),
                ("https://push.example/dead-2".to_string(), 404),
            ]),
            ..Default::default()
        });
        let dispatcher = PushDispatcher::new(store.clone(), gateway);

        let report = dispatcher.dispatch(user, &message()).await.unwrap();
        assert_eq!(
            report,
            DispatchReport {
                sent: 1,
                removed: 0,
                failed: 2
            }
        );
        // Every gone subscription was still attempted.
        assert_eq!(*store.remove_attempts.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn no_subscriptions_sends_nothing() {
        let store = Arc::new(MemoryStore::with(true, &[], DbId::new_v4()));
        let dispatcher = PushDispatcher::new(store, Arc::new(ScriptedGateway::default()));
        let report = dispatcher.dispatch(DbId::new_v4(), &message()).await.unwrap();
        assert_eq!(report.sent, 0);
    }
}
