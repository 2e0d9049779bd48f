//! Unread accounting against a per-user read watermark.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use dsefs_storage::KeyValueStore;
use serde::Serialize;
use tracing::warn;

use crate::{Message, LAST_READ_KEY_PREFIX};

/// Raised when new unread messages arrive while the chat is not on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadNotification {
    pub message_id: String,
    pub sender_name: String,
    pub preview: String,
    pub unread_count: usize,
}

impl UnreadNotification {
    pub(crate) fn for_message(message: &Message, unread_count: usize) -> Self {
        let preview = if !message.text.is_empty() {
            message.text.clone()
        } else if let Some(attachment) = &message.attachment {
            format!("PJ: {}", attachment.name)
        } else {
            "PJ".to_string()
        };
        Self {
            message_id: message.id.clone(),
            sender_name: message.sender_name.clone(),
            preview,
            unread_count,
        }
    }
}

pub fn watermark_key(user_id: &str) -> String {
    format!("{LAST_READ_KEY_PREFIX}{user_id}")
}

/// The user's read watermark, or the Unix epoch when unset or unreadable.
pub fn read_watermark(storage: &dyn KeyValueStore, user_id: &str) -> DateTime<Utc> {
    let key = watermark_key(user_id);
    let raw = match storage.get(&key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return DateTime::UNIX_EPOCH,
        Err(err) => {
            warn!(user_id, error = %err, "failed to read watermark");
            return DateTime::UNIX_EPOCH;
        }
    };
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(err) => {
            warn!(user_id, value = %raw, error = %err, "ignoring unparsable watermark");
            DateTime::UNIX_EPOCH
        }
    }
}

/// Store the watermark at millisecond precision and return the stored instant.
pub fn write_watermark(
    storage: &dyn KeyValueStore,
    user_id: &str,
    at: DateTime<Utc>,
) -> dsefs_storage::Result<DateTime<Utc>> {
    let stamp = at.trunc_subsecs(3);
    storage.set(
        &watermark_key(user_id),
        &stamp.to_rfc3339_opts(SecondsFormat::Millis, true),
    )?;
    Ok(stamp)
}

/// Non-deleted messages from other users newer than `watermark`.
pub fn unread_messages<'a>(
    messages: &'a [Message],
    user_id: &str,
    watermark: DateTime<Utc>,
) -> impl Iterator<Item = &'a Message> + 'a {
    let user_id = user_id.to_string();
    messages
        .iter()
        .filter(move |m| !m.is_deleted && m.sender_id != user_id && m.timestamp > watermark)
}

/// Tracks the unread count and detects increases, per user.
#[derive(Debug, Default)]
pub(crate) struct UnreadTracker {
    count: usize,
    previous: HashMap<String, usize>,
}

impl UnreadTracker {
    pub(crate) fn count(&self) -> usize {
        self.count
    }

    /// No user: nothing is unread. Earlier counts are kept for when a user
    /// returns.
    pub(crate) fn clear_count(&mut self) {
        self.count = 0;
    }

    /// Recompute; returns a notification when the count rose and the chat is
    /// not being viewed.
    pub(crate) fn update(
        &mut self,
        messages: &[Message],
        user_id: &str,
        watermark: DateTime<Utc>,
        viewing_chat: bool,
    ) -> Option<UnreadNotification> {
        let mut count = 0;
        let mut latest: Option<&Message> = None;
        for message in unread_messages(messages, user_id, watermark) {
            count += 1;
            if latest.map_or(true, |l| message.timestamp >= l.timestamp) {
                latest = Some(message);
            }
        }

        let previous = self.previous.insert(user_id.to_string(), count).unwrap_or(0);
        let rose = count > 0 && count > previous;
        self.count = count;

        if rose && !viewing_chat {
            latest.map(|message| UnreadNotification::for_message(message, count))
        } else {
            None
        }
    }
}
