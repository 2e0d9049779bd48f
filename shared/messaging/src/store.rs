//! Threaded chat store with reactions, soft deletion and unread accounting.

use chrono::{DateTime, Utc};
use dsefs_storage::{load_json, save_json, SharedStore, StorageError, StorageEvent, StorageSubscription};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::attachment::OutgoingFile;
use crate::unread::{read_watermark, write_watermark, UnreadTracker};
use crate::{CurrentUser, Message, MessagingError, Result, UnreadNotification, MESSAGES_STORAGE_KEY};

/// Default cap on attachment payloads: 5 MiB.
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct MessagingConfig {
    pub max_attachment_bytes: u64,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
        }
    }
}

/// A message being composed.
#[derive(Debug, Clone, Default)]
pub struct OutgoingMessage {
    pub text: String,
    pub reply_to: Option<String>,
    pub file: Option<OutgoingFile>,
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn replying_to(mut self, message_id: impl Into<String>) -> Self {
        self.reply_to = Some(message_id.into());
        self
    }

    pub fn with_file(mut self, file: OutgoingFile) -> Self {
        self.file = Some(file);
        self
    }
}

/// The shared message list, seen from one user's session.
///
/// Every mutation builds the full list before persisting it under
/// [`MESSAGES_STORAGE_KEY`]. Writes made by other handles of the same backend
/// are picked up through [`MessageStore::apply_storage_event`].
pub struct MessageStore {
    storage: SharedStore,
    config: MessagingConfig,
    messages: Vec<Message>,
    current_user: Option<CurrentUser>,
    viewing_chat: bool,
    unread: UnreadTracker,
    notify_tx: mpsc::UnboundedSender<UnreadNotification>,
}

impl MessageStore {
    /// Load the stored list and return the store with the receiving end of
    /// its unread notifications.
    pub fn open(
        storage: SharedStore,
        config: MessagingConfig,
        current_user: Option<CurrentUser>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<UnreadNotification>)> {
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let messages = load_messages(&storage)?;
        info!(count = messages.len(), "message store opened");

        let mut store = Self {
            storage,
            config,
            messages,
            current_user,
            viewing_chat: false,
            unread: UnreadTracker::default(),
            notify_tx,
        };
        store.refresh_unread();
        Ok((store, notify_rx))
    }

    pub fn config(&self) -> &MessagingConfig {
        &self.config
    }

    pub fn current_user(&self) -> Option<&CurrentUser> {
        self.current_user.as_ref()
    }

    /// Switch the session user. Each user keeps their own notification
    /// edge, so switching back and forth never re-announces old messages.
    pub fn set_current_user(&mut self, user: Option<CurrentUser>) {
        self.current_user = user;
        self.refresh_unread();
    }

    /// Whether the chat is on screen; suppresses notifications when set.
    pub fn set_viewing_chat(&mut self, viewing: bool) {
        self.viewing_chat = viewing;
    }

    /// All messages, deleted ones included, ascending by timestamp.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Messages to render: non-deleted, ascending by timestamp.
    pub fn display_messages(&self) -> Vec<&Message> {
        self.messages.iter().filter(|m| !m.is_deleted).collect()
    }

    pub fn get(&self, message_id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    pub fn unread_count(&self) -> usize {
        self.unread.count()
    }

    pub fn send(&mut self, draft: OutgoingMessage) -> Result<Option<Message>> {
        self.send_at(draft, Utc::now())
    }

    /// Append a message stamped `now`. Returns `Ok(None)` when there is no
    /// user or nothing to send.
    pub fn send_at(&mut self, draft: OutgoingMessage, now: DateTime<Utc>) -> Result<Option<Message>> {
        let Some(user) = self.current_user.as_ref() else {
            debug!("ignoring send without a current user");
            return Ok(None);
        };
        let text = draft.text.trim();
        if text.is_empty() && draft.file.is_none() {
            return Ok(None);
        }
        if let Some(file) = &draft.file {
            let limit = self.config.max_attachment_bytes;
            if file.size() > limit {
                return Err(MessagingError::AttachmentTooLarge {
                    name: file.name.clone(),
                    size: file.size(),
                    limit,
                });
            }
        }

        let mut message = Message::new(user, text, now);
        if let Some(reply_to) = draft.reply_to.as_deref() {
            match self.get(reply_to) {
                Some(quoted) if !quoted.is_deleted => message.quote(quoted),
                _ => debug!(reply_to, "reply target missing or deleted"),
            }
        }
        message.attachment = draft.file.map(OutgoingFile::into_attachment);

        let mut messages = self.messages.clone();
        messages.push(message.clone());
        self.replace_and_persist(messages)?;
        Ok(Some(message))
    }

    /// Soft-delete a message. Only its sender or an admin may do so; anyone
    /// else gets `Ok(false)`.
    pub fn delete(&mut self, message_id: &str) -> Result<bool> {
        let Some(user) = self.current_user.as_ref() else {
            return Ok(false);
        };
        let mut messages = self.messages.clone();
        let Some(message) = messages.iter_mut().find(|m| m.id == message_id) else {
            return Ok(false);
        };
        if message.sender_id != user.id && !user.is_admin() {
            debug!(message_id, user_id = %user.id, "delete not permitted");
            return Ok(false);
        }
        if !message.soft_delete() {
            return Ok(false);
        }
        self.replace_and_persist(messages)?;
        Ok(true)
    }

    /// Toggle the current user's `emoji` reaction on a message.
    pub fn toggle_reaction(&mut self, message_id: &str, emoji: &str) -> Result<bool> {
        let Some(user_id) = self.current_user.as_ref().map(|u| u.id.clone()) else {
            return Ok(false);
        };
        let mut messages = self.messages.clone();
        let Some(message) = messages.iter_mut().find(|m| m.id == message_id) else {
            return Ok(false);
        };
        message.toggle_reaction(emoji, &user_id);
        self.replace_and_persist(messages)?;
        Ok(true)
    }

    /// Mark everything read as of now. `_message_ids` is accepted for
    /// callers that track visibility, but marking is all-or-nothing.
    pub fn mark_as_read(&mut self, message_ids: Option<&[String]>) -> Result<usize> {
        self.mark_as_read_at(message_ids, Utc::now())
    }

    pub fn mark_as_read_at(&mut self, _message_ids: Option<&[String]>, now: DateTime<Utc>) -> Result<usize> {
        let Some(user) = self.current_user.as_ref() else {
            return Ok(0);
        };
        let stamp = write_watermark(self.storage.as_ref(), &user.id, now)?;
        self.recount(stamp);
        Ok(self.unread.count())
    }

    /// Change notifications from other handles of the backing store.
    pub fn subscribe_changes(&self) -> StorageSubscription {
        self.storage.subscribe()
    }

    /// Adopt a message list written elsewhere. Returns whether the in-memory
    /// list changed.
    pub fn apply_storage_event(&mut self, event: &StorageEvent) -> bool {
        if event.key != MESSAGES_STORAGE_KEY {
            return false;
        }
        let Some(raw) = event.new_value.as_deref() else {
            return false;
        };
        match serde_json::from_str::<Vec<Message>>(raw) {
            Ok(mut messages) => {
                sort_by_timestamp(&mut messages);
                self.messages = messages;
                self.refresh_unread();
                true
            }
            Err(err) => {
                warn!(error = %err, "ignoring unreadable message list from another session");
                false
            }
        }
    }

    /// Re-read the list from storage.
    pub fn reload(&mut self) -> Result<()> {
        self.messages = load_messages(&self.storage)?;
        self.refresh_unread();
        Ok(())
    }

    fn replace_and_persist(&mut self, mut messages: Vec<Message>) -> Result<()> {
        sort_by_timestamp(&mut messages);
        self.messages = messages;
        self.refresh_unread();
        save_json(self.storage.as_ref(), MESSAGES_STORAGE_KEY, &self.messages)?;
        Ok(())
    }

    fn refresh_unread(&mut self) {
        let Some(user) = self.current_user.as_ref() else {
            self.unread.clear_count();
            return;
        };
        let watermark = read_watermark(self.storage.as_ref(), &user.id);
        self.recount(watermark);
    }

    fn recount(&mut self, watermark: DateTime<Utc>) {
        let Some(user) = self.current_user.as_ref() else {
            self.unread.clear_count();
            return;
        };
        if let Some(notification) =
            self.unread
                .update(&self.messages, &user.id, watermark, self.viewing_chat)
        {
            debug!(message_id = %notification.message_id, unread = notification.unread_count, "new unread message");
            if self.notify_tx.send(notification).is_err() {
                debug!("unread notification receiver dropped");
            }
        }
    }
}

/// Keep `store` in step with writes made through other handles of its
/// backend. Runs until the backend's change channel closes.
pub fn spawn_sync(store: Arc<RwLock<MessageStore>>, mut changes: StorageSubscription) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = changes.recv().await {
            if store.write().await.apply_storage_event(&event) {
                debug!(key = %event.key, "applied message list from another session");
            }
        }
        debug!("message sync stopped");
    })
}

fn sort_by_timestamp(messages: &mut [Message]) {
    messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
}

/// Stored messages, ascending. A malformed document is dropped and its key
/// removed; backend failures propagate.
fn load_messages(storage: &SharedStore) -> Result<Vec<Message>> {
    match load_json::<Vec<Message>>(storage.as_ref(), MESSAGES_STORAGE_KEY) {
        Ok(Some(mut messages)) => {
            sort_by_timestamp(&mut messages);
            Ok(messages)
        }
        Ok(None) => Ok(Vec::new()),
        Err(err @ StorageError::Serialization { .. }) => {
            warn!(error = %err, "discarding unreadable message list");
            storage.remove(MESSAGES_STORAGE_KEY)?;
            Ok(Vec::new())
        }
        Err(err) => Err(err.into()),
    }
}
