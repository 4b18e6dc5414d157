use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::{PortalEvent, SyncChannel};
use crate::storage::KeyValueStore;

/// Polling fallback for writes that bypass the sync channel (another
/// process sharing the storage directory, a hand-edited file).
pub struct StorageWatcher;

impl StorageWatcher {
    pub fn spawn(
        storage: Arc<dyn KeyValueStore>,
        key: &'static str,
        interval: Duration,
        channel: SyncChannel,
    ) -> WatcherHandle {
        let mut last = read_raw(storage.as_ref(), key);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let current = read_raw(storage.as_ref(), key);
                if current != last {
                    debug!("Storage key '{key}' changed outside the sync channel");
                    last = current;
                    channel.publish(PortalEvent::CartUpdated);
                }
            }
        });

        WatcherHandle { task }
    }
}

fn read_raw(storage: &dyn KeyValueStore, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!("Storage watcher failed to read '{key}': {e}");
            None
        }
    }
}

/// Owns the polling task; dropping the handle stops it.
pub struct WatcherHandle {
    task: JoinHandle<()>,
}

impl WatcherHandle {
    #[cfg(test)]
    fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, CART_KEY};

    const POLL: Duration = Duration::from_millis(500);

    #[tokio::test(start_paused = true)]
    async fn test_detects_external_write() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let channel = SyncChannel::new();
        let mut sub = channel.subscribe();
        let _handle = StorageWatcher::spawn(storage.clone(), CART_KEY, POLL, channel.clone());

        storage.set(CART_KEY, r#"[{"name":"Starter"}]"#).unwrap();

        let event = tokio::time::timeout(Duration::from_secs(2), sub.recv())
            .await
            .unwrap();
        assert_eq!(event, Some(PortalEvent::CartUpdated));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_when_nothing_changes() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        storage.set(CART_KEY, "[]").unwrap();
        let channel = SyncChannel::new();
        let mut sub = channel.subscribe();
        let _handle = StorageWatcher::spawn(storage, CART_KEY, POLL, channel.clone());

        let waited = tokio::time::timeout(Duration::from_secs(3), sub.recv()).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let channel = SyncChannel::new();
        let mut sub = channel.subscribe();
        let handle = StorageWatcher::spawn(storage.clone(), CART_KEY, POLL, channel.clone());
        assert!(handle.is_running());
        drop(handle);

        storage.set(CART_KEY, "[]").unwrap();
        let waited = tokio::time::timeout(Duration::from_secs(3), sub.recv()).await;
        assert!(waited.is_err());
    }
}
