//! Key/value persistence, the portal's equivalent of browser local storage.
//!
//! Everything that must survive a restart (bearer token, cart) goes through
//! `KeyValueStore`. Values are opaque strings; serialization happens in the
//! owning module so the medium stays engine-agnostic.

use thiserror::Error;

pub mod file;
#[cfg(test)]
pub mod memory;

pub use file::FileStore;
#[cfg(test)]
pub use memory::MemoryStore;

/// Bearer token of the signed-in employer.
pub const TOKEN_KEY: &str = "token";
/// JSON-serialized cart items.
pub const CART_KEY: &str = "paymentCart";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a key that does not exist is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
