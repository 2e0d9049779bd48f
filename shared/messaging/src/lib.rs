//! Chat models and the threaded reaction store shared across DSEFS services.

pub mod attachment;
pub mod store;
pub mod unread;

pub use attachment::{Attachment, OutgoingFile};
pub use store::{spawn_sync, MessageStore, MessagingConfig, OutgoingMessage};
pub use unread::UnreadNotification;

use chrono::{DateTime, SubsecRound, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MESSAGES_STORAGE_KEY: &str = "dsefs_messages_db";
pub const LAST_READ_KEY_PREFIX: &str = "dsefs_last_read_ts_";
pub const DELETED_PLACEHOLDER: &str = "Message supprimé.";

/// Emoji → user ids, in first-reaction order.
pub type Reactions = IndexMap<String, Vec<String>>;

/// Role granted by the remote user directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Lecteur,
    Editeur,
    Admin,
}

/// The authenticated user on whose behalf the store acts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub prenom: String,
    pub nom: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn new(id: impl Into<String>, prenom: impl Into<String>, nom: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: id.into(),
            prenom: prenom.into(),
            nom: nom.into(),
            role,
        }
    }

    /// `"<prenom> <nom>"`, or `Anonyme` when both are blank.
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.prenom, self.nom);
        let trimmed = name.trim();
        if trimmed.is_empty() {
            "Anonyme".to_string()
        } else {
            trimmed.to_string()
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// One chat entry as persisted in the shared message list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender_id: String,
    pub sender_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<String>,
    /// Copy of the quoted text taken at send time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_message_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_message_sender_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    /// Absent rather than empty when nobody reacted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactions: Option<Reactions>,
}

impl Message {
    /// New message stamped at `timestamp`, truncated to the millisecond
    /// precision of stored timestamps.
    pub fn new(sender: &CurrentUser, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender_id: sender.id.clone(),
            sender_name: sender.display_name(),
            timestamp: timestamp.trunc_subsecs(3),
            is_deleted: false,
            reply_to_message_id: None,
            quoted_message_text: None,
            quoted_message_sender_name: None,
            attachment: None,
            reactions: None,
        }
    }

    /// Snapshot `quoted` into this message as a one-level reply.
    pub fn quote(&mut self, quoted: &Message) {
        self.reply_to_message_id = Some(quoted.id.clone());
        self.quoted_message_text = Some(quoted.text.clone());
        self.quoted_message_sender_name = Some(quoted.sender_name.clone());
    }

    /// Whether `user_id` reacted with `emoji`.
    pub fn has_reaction(&self, emoji: &str, user_id: &str) -> bool {
        self.reactions
            .as_ref()
            .and_then(|reactions| reactions.get(emoji))
            .is_some_and(|users| users.iter().any(|u| u == user_id))
    }

    /// Add or remove `user_id` under `emoji`, pruning empty entries.
    pub fn toggle_reaction(&mut self, emoji: &str, user_id: &str) {
        let mut reactions = self.reactions.take().unwrap_or_default();
        let users = reactions.entry(emoji.to_string()).or_default();
        match users.iter().position(|u| u == user_id) {
            Some(index) => {
                users.remove(index);
            }
            None => users.push(user_id.to_string()),
        }
        if users.is_empty() {
            reactions.shift_remove(emoji);
        }
        self.reactions = (!reactions.is_empty()).then_some(reactions);
    }

    /// Soft-delete. The placeholder only replaces the text the first time.
    pub fn soft_delete(&mut self) -> bool {
        if self.is_deleted {
            return false;
        }
        self.is_deleted = true;
        self.text = DELETED_PLACEHOLDER.to_string();
        true
    }
}

/// Messaging-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("attachment {name:?} is {size} bytes, above the {limit} byte limit")]
    AttachmentTooLarge { name: String, size: u64, limit: u64 },
    #[error("failed to read attachment: {0}")]
    AttachmentRead(#[from] std::io::Error),
    #[error("storage error: {0}")]
    Storage(#[from] dsefs_storage::StorageError),
}

pub type Result<T> = std::result::Result<T, MessagingError>;
