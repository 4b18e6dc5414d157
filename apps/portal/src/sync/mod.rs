//! Cross-component sync channel.
//!
//! A process-wide broadcast of "something changed" notifications. Events
//! carry no authoritative data: observers always reload from the cart store
//! or the session after receiving one.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

pub mod watcher;

pub use watcher::{StorageWatcher, WatcherHandle};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PortalEvent {
    CartUpdated,
    AuthStateChanged { token: Option<String> },
    UserDataUpdated,
}

impl PortalEvent {
    /// Event name as seen by the rendering layer.
    pub fn wire_name(&self) -> &'static str {
        match self {
            PortalEvent::CartUpdated => "cartUpdated",
            PortalEvent::AuthStateChanged { .. } => "authStateChanged",
            PortalEvent::UserDataUpdated => "userDataUpdated",
        }
    }
}

#[derive(Clone)]
pub struct SyncChannel {
    tx: broadcast::Sender<PortalEvent>,
}

impl SyncChannel {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Publishing with no live subscribers is not an error.
    pub fn publish(&self, event: PortalEvent) {
        debug!("Publishing {}", event.wire_name());
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SyncChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription. Dropping it unsubscribes.
pub struct Subscription {
    rx: broadcast::Receiver<PortalEvent>,
}

impl Subscription {
    /// Waits for the next event. Returns `None` once the channel is closed.
    ///
    /// A lagging subscriber skips the events it missed; since events carry
    /// no data, the next one tells it to reload just the same.
    pub async fn recv(&mut self) -> Option<PortalEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("Subscriber lagged, skipped {skipped} events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant; `None` when nothing is queued.
    pub fn try_recv(&mut self) -> Option<PortalEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let channel = SyncChannel::new();
        channel.publish(PortalEvent::CartUpdated);
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_all_subscribers_observe_event() {
        let channel = SyncChannel::new();
        let mut header = channel.subscribe();
        let mut dashboard = channel.subscribe();

        channel.publish(PortalEvent::AuthStateChanged {
            token: Some("t".into()),
        });

        assert_eq!(
            header.recv().await,
            Some(PortalEvent::AuthStateChanged {
                token: Some("t".into())
            })
        );
        assert_eq!(
            dashboard.recv().await.map(|e| e.wire_name()),
            Some("authStateChanged")
        );
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let channel = SyncChannel::new();
        let sub = channel.subscribe();
        assert_eq!(channel.subscriber_count(), 1);
        drop(sub);
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn test_try_recv_empty() {
        let channel = SyncChannel::new();
        let mut sub = channel.subscribe();
        assert_eq!(sub.try_recv(), None);
        channel.publish(PortalEvent::UserDataUpdated);
        assert_eq!(sub.try_recv(), Some(PortalEvent::UserDataUpdated));
    }

    #[test]
    fn test_event_serializes_with_camel_case_tag() {
        let json = serde_json::to_value(PortalEvent::AuthStateChanged { token: None }).unwrap();
        assert_eq!(json["type"], "authStateChanged");
        assert!(json["token"].is_null());
    }
}
