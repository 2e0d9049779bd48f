//! Key-value storage shared by the DSEFS dashboard subsystems.
//!
//! The dashboard keeps every collection as a JSON document under a string key.
//! Backends implement [`KeyValueStore`]; each handle carries an origin id so
//! that change notifications can be delivered to every *other* handle, the
//! same way browser storage events only reach other tabs.

mod memory;
mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

/// Capacity of the change notification channel of a backend.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Identifies the handle that performed a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OriginId(pub Uuid);

impl OriginId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OriginId {
    fn default() -> Self {
        Self::new()
    }
}

/// Notification emitted after a key changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
    pub origin: OriginId,
}

/// Synchronous string-keyed, string-valued storage with change notification.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// Subscribe to writes performed through other handles of this backend.
    fn subscribe(&self) -> StorageSubscription;
}

/// Storage handle shared between subsystems.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Receiving side of a backend's change notifications.
///
/// Events written by the subscribing handle itself are skipped.
pub struct StorageSubscription {
    origin: OriginId,
    rx: broadcast::Receiver<StorageEvent>,
}

impl StorageSubscription {
    pub fn new(origin: OriginId, rx: broadcast::Receiver<StorageEvent>) -> Self {
        Self { origin, rx }
    }

    /// Wait for the next foreign change. Returns `None` once the backend is gone.
    pub async fn recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.origin == self.origin => continue,
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "storage subscriber lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Return the next pending foreign change without waiting.
    pub fn try_recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) if event.origin == self.origin => continue,
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "storage subscriber lagged behind");
                }
                Err(_) => return None,
            }
        }
    }
}

/// Read and decode a JSON document. A missing key yields `Ok(None)`.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Serialization {
            key: key.to_string(),
            source,
        })
}

/// Encode a value as JSON and store it under `key`.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value).map_err(|source| StorageError::Serialization {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &json)
}

/// Storage-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend failure: {0}")]
    Backend(String),
    #[error("value under {key:?} is not valid JSON: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("stored value under {0:?} is not valid UTF-8")]
    InvalidUtf8(String),
    #[error("storage lock poisoned")]
    LockPoisoned,
    #[error("failed to prepare storage directory: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
