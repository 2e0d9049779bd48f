//! In-process storage shared between handles.

use crate::{
    KeyValueStore, OriginId, Result, StorageError, StorageEvent, StorageSubscription,
    EVENT_CHANNEL_CAPACITY,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

struct Shared {
    entries: RwLock<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

/// Volatile key-value store. Cloning keeps the origin; [`MemoryStore::open_tab`]
/// creates a sibling handle whose writes are visible to the others as events.
#[derive(Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    origin: OriginId,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                entries: RwLock::new(HashMap::new()),
                events,
            }),
            origin: OriginId::new(),
        }
    }

    /// Another handle over the same entries, with its own origin.
    pub fn open_tab(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            origin: OriginId::new(),
        }
    }

    pub fn origin(&self) -> OriginId {
        self.origin
    }

    fn publish(&self, key: &str, new_value: Option<String>) {
        let _ = self.shared.events.send(StorageEvent {
            key: key.to_string(),
            new_value,
            origin: self.origin,
        });
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let guard = self
            .shared
            .entries
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(guard.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        {
            let mut guard = self
                .shared
                .entries
                .write()
                .map_err(|_| StorageError::LockPoisoned)?;
            guard.insert(key.to_string(), value.to_string());
        }
        self.publish(key, Some(value.to_string()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let removed = {
            let mut guard = self
                .shared
                .entries
                .write()
                .map_err(|_| StorageError::LockPoisoned)?;
            guard.remove(key)
        };
        if removed.is_some() {
            self.publish(key, None);
        }
        Ok(())
    }

    fn subscribe(&self) -> StorageSubscription {
        StorageSubscription::new(self.origin, self.shared.events.subscribe())
    }
}
