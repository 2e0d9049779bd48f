use crate::config::AppConfig;
use anyhow::Context;
use dsefs_messaging::{spawn_sync, MessageStore, MessagingConfig, UnreadNotification};
use dsefs_search::{SearchAggregator, SearchConfig, SearchHistory};
use dsefs_storage::{SharedStore, SledStore};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

pub struct AppState {
    config: AppConfig,
    storage: SharedStore,
    search: SearchAggregator,
    history: RwLock<SearchHistory>,
    messages: Arc<RwLock<MessageStore>>,
    notifications: Mutex<Option<mpsc::UnboundedReceiver<UnreadNotification>>>,
}

impl AppState {
    /// Open the sled database under `config.data_dir`.
    pub fn new(config: AppConfig) -> anyhow::Result<Arc<Self>> {
        let store = SledStore::open(&config.data_dir).with_context(|| {
            format!("failed to open storage at {}", config.data_dir.display())
        })?;
        Self::with_storage(config, Arc::new(store))
    }

    pub fn with_storage(config: AppConfig, storage: SharedStore) -> anyhow::Result<Arc<Self>> {
        let search_config = SearchConfig::default();
        let history = SearchHistory::load(Arc::clone(&storage), search_config.max_history_items);
        let search = SearchAggregator::new(Arc::clone(&storage), search_config);
        let (messages, notifications) =
            MessageStore::open(Arc::clone(&storage), MessagingConfig::default(), None)
                .context("failed to load chat messages")?;

        Ok(Arc::new(Self {
            config,
            storage,
            search,
            history: RwLock::new(history),
            messages: Arc::new(RwLock::new(messages)),
            notifications: Mutex::new(Some(notifications)),
        }))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn build_id(&self) -> &str {
        &self.config.build_id
    }

    pub fn storage(&self) -> &SharedStore {
        &self.storage
    }

    pub fn search(&self) -> &SearchAggregator {
        &self.search
    }

    pub fn history(&self) -> &RwLock<SearchHistory> {
        &self.history
    }

    pub fn messages(&self) -> &RwLock<MessageStore> {
        &self.messages
    }

    /// Follow chat writes made through other handles of the backing store.
    pub fn spawn_message_sync(&self) -> JoinHandle<()> {
        spawn_sync(Arc::clone(&self.messages), self.storage.subscribe())
    }

    /// Hand out the unread notification stream. Only the first caller gets it.
    pub fn take_notifications(&self) -> Option<mpsc::UnboundedReceiver<UnreadNotification>> {
        self.notifications.lock().ok()?.take()
    }
}
