//! Fire-and-forget delivery of notifications and audit entries.

use std::sync::Arc;

use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::application::ports::{AuditEntry, AuditSink, Notification, NotificationSink};

/// Spawns side effects after a state change has been committed.
///
/// Deliveries never block the caller and their failures are only logged.
/// Spawned deliveries are tracked so [`flush`](Self::flush) can wait for them.
pub struct SideEffectDispatcher<N, A> {
    notifications: Arc<N>,
    audit: Arc<A>,
    tracker: TaskTracker,
    enabled: bool,
}

impl<N, A> SideEffectDispatcher<N, A>
where
    N: NotificationSink + 'static,
    A: AuditSink + 'static,
{
    /// Creates a dispatcher. When `enabled` is false every side effect is dropped.
    #[must_use]
    pub fn new(notifications: Arc<N>, audit: Arc<A>, enabled: bool) -> Self {
        Self {
            notifications,
            audit,
            tracker: TaskTracker::new(),
            enabled,
        }
    }

    /// Queues a notification.
    pub fn notify(&self, notification: Notification) {
        if !self.enabled {
            debug!(kind = ?notification.kind, "side effects disabled, notification dropped");
            return;
        }

        let sink = Arc::clone(&self.notifications);
        self.tracker.spawn(async move {
            let kind = notification.kind;
            let recipient = notification.recipient;
            if let Err(error) = sink.notify(notification).await {
                warn!(?kind, %recipient, %error, "notification delivery failed");
            }
        });
    }

    /// Queues an audit entry.
    pub fn audit(&self, entry: AuditEntry) {
        if !self.enabled {
            debug!(action = %entry.action, "side effects disabled, audit entry dropped");
            return;
        }

        let sink = Arc::clone(&self.audit);
        self.tracker.spawn(async move {
            let action = entry.action.clone();
            let resource_id = entry.resource_id.clone();
            if let Err(error) = sink.record(entry).await {
                warn!(%action, %resource_id, %error, "audit entry not recorded");
            }
        });
    }

    /// Waits until every queued side effect has finished.
    pub async fn flush(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Number of deliveries still running.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }
}
