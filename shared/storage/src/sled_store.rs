use std::path::Path;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use crate::{
    KeyValueStore, OriginId, Result, StorageError, StorageEvent, StorageSubscription,
    EVENT_CHANNEL_CAPACITY,
};

/// Durable key-value store backed by a sled tree.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
    events: Arc<broadcast::Sender<StorageEvent>>,
    origin: OriginId,
}

impl SledStore {
    const TREE: &'static str = "local_storage";

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        debug!(?path, "opened sled storage");
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            db,
            events: Arc::new(events),
            origin: OriginId::new(),
        })
    }

    /// Another handle over the same database, with its own origin.
    pub fn open_tab(&self) -> Self {
        Self {
            db: self.db.clone(),
            events: Arc::clone(&self.events),
            origin: OriginId::new(),
        }
    }

    fn tree(&self) -> sled::Result<sled::Tree> {
        self.db.open_tree(Self::TREE)
    }

    fn publish(&self, key: &str, new_value: Option<String>) {
        let _ = self.events.send(StorageEvent {
            key: key.to_string(),
            new_value,
            origin: self.origin,
        });
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let tree = self.tree()?;
        let Some(value) = tree.get(key.as_bytes())? else {
            return Ok(None);
        };
        String::from_utf8(value.to_vec())
            .map(Some)
            .map_err(|_| StorageError::InvalidUtf8(key.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let tree = self.tree()?;
        tree.insert(key.as_bytes(), value.as_bytes())?;
        tree.flush()?;
        self.publish(key, Some(value.to_string()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let tree = self.tree()?;
        let removed = tree.remove(key.as_bytes())?;
        tree.flush()?;
        if removed.is_some() {
            self.publish(key, None);
        }
        Ok(())
    }

    fn subscribe(&self) -> StorageSubscription {
        StorageSubscription::new(self.origin, self.events.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = SledStore::open(dir.path()).unwrap();
            store.set("dsefs_messages_db", "[]").unwrap();
        }

        let reopened = SledStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get("dsefs_messages_db").unwrap().as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn remove_clears_key_and_notifies_other_handles() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        let other = store.open_tab();
        let mut events = other.subscribe();

        store.set("k", "v").unwrap();
        store.remove("k").unwrap();

        assert_eq!(other.get("k").unwrap(), None);
        assert_eq!(events.try_recv().unwrap().new_value.as_deref(), Some("v"));
        assert_eq!(events.try_recv().unwrap().new_value, None);
    }
}
