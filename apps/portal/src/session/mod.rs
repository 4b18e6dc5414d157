//! Bearer-token session persisted under the `token` storage key.

use std::sync::Arc;

use tracing::{info, warn};

use crate::storage::{KeyValueStore, StorageError, TOKEN_KEY};
use crate::sync::{PortalEvent, SyncChannel};

#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    sync: SyncChannel,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStore>, sync: SyncChannel) -> Self {
        Self { storage, sync }
    }

    /// Current token, if any. Unreadable storage counts as signed out.
    pub fn token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!("Failed to read session token: {e}");
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn set_token(&self, token: &str) -> Result<(), StorageError> {
        self.storage.set(TOKEN_KEY, token)?;
        info!("Session token stored");
        self.sync.publish(PortalEvent::AuthStateChanged {
            token: Some(token.to_string()),
        });
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(TOKEN_KEY)?;
        info!("Session token cleared");
        self.sync
            .publish(PortalEvent::AuthStateChanged { token: None });
        Ok(())
    }
}
