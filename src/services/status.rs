//! Push source for submodule status snapshots
//!
//! Producers publish complete snapshots; subscribers always see the newest
//! one. Snapshots published while nobody listens are kept and can be
//! delivered again with [`SubmoduleStatusProvider::resend_cached`].

use crate::services::repo::SubmoduleInfoResult;
use std::sync::Arc;
use tokio::sync::watch;

type Snapshot = Option<Arc<SubmoduleInfoResult>>;

#[derive(Clone)]
pub struct SubmoduleStatusProvider {
    sender: Arc<watch::Sender<Snapshot>>,
}

impl Default for SubmoduleStatusProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmoduleStatusProvider {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Replace the cached snapshot and notify every subscriber
    pub fn publish(&self, snapshot: SubmoduleInfoResult) {
        tracing::debug!(
            submodules = snapshot.displayed().len(),
            subscribers = self.sender.receiver_count(),
            "publishing submodule status"
        );
        self.sender.send_replace(Some(Arc::new(snapshot)));
    }

    /// Deliver the cached snapshot again; returns false when there is none
    pub fn resend_cached(&self) -> bool {
        if self.sender.borrow().is_none() {
            return false;
        }
        self.sender.send_modify(|_| {});
        true
    }

    pub fn cached(&self) -> Snapshot {
        self.sender.borrow().clone()
    }

    /// Subscribe to snapshots published from now on
    pub fn subscribe(&self) -> StatusSubscription {
        StatusSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Receiving end of a [`SubmoduleStatusProvider`]; dropping it unsubscribes
pub struct StatusSubscription {
    receiver: watch::Receiver<Snapshot>,
}

impl StatusSubscription {
    /// Wait for the next snapshot; `None` once the provider is gone
    pub async fn next(&mut self) -> Option<Arc<SubmoduleInfoResult>> {
        loop {
            self.receiver.changed().await.ok()?;
            if let Some(snapshot) = self.receiver.borrow_and_update().clone() {
                return Some(snapshot);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::repo::SubmoduleInfo;
    use std::time::Duration;

    fn snapshot(path: &str) -> SubmoduleInfoResult {
        SubmoduleInfoResult {
            our_submodules: vec![SubmoduleInfo::new(path, path, false)],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let provider = SubmoduleStatusProvider::new();
        let mut subscription = provider.subscribe();

        provider.publish(snapshot("/r/a/"));
        let received = subscription.next().await.unwrap();
        assert_eq!(received.our_submodules[0].path, "/r/a/");
    }

    #[tokio::test]
    async fn test_resend_cached() {
        let provider = SubmoduleStatusProvider::new();
        assert!(!provider.resend_cached());

        provider.publish(snapshot("/r/a/"));
        // Subscribed after the publish, so nothing is pending yet
        let mut subscription = provider.subscribe();
        let pending = tokio::time::timeout(Duration::from_millis(20), subscription.next()).await;
        assert!(pending.is_err());

        assert!(provider.resend_cached());
        let received = subscription.next().await.unwrap();
        assert_eq!(received.our_submodules[0].path, "/r/a/");
    }

    #[tokio::test]
    async fn test_dropping_subscription_unsubscribes() {
        let provider = SubmoduleStatusProvider::new();
        let subscription = provider.subscribe();
        assert_eq!(provider.subscriber_count(), 1);
        drop(subscription);
        assert_eq!(provider.subscriber_count(), 0);
    }
}
