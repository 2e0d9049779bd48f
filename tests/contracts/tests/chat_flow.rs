use std::sync::Arc;

use chrono::Duration;
use dsefs_contract_tests::{at, user};
use dsefs_messaging::{MessageStore, MessagingConfig, OutgoingMessage, DELETED_PLACEHOLDER};
use dsefs_storage::MemoryStore;

fn open_tab(
    storage: &MemoryStore,
    id: &str,
) -> (
    MessageStore,
    tokio::sync::mpsc::UnboundedReceiver<dsefs_messaging::UnreadNotification>,
) {
    MessageStore::open(
        Arc::new(storage.open_tab()),
        MessagingConfig::default(),
        Some(user(id, "A", "B")),
    )
    .unwrap()
}

#[test]
fn first_message_has_expected_shape() {
    let storage = MemoryStore::new();
    let (mut store, _rx) = open_tab(&storage, "u1");

    store.send(OutgoingMessage::text("Bonjour")).unwrap();

    let messages = store.display_messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender_id, "u1");
    assert_eq!(messages[0].sender_name, "A B");
    assert!(messages[0].attachment.is_none());
    assert!(messages[0].reactions.is_none());
}

#[test]
fn two_tabs_converge_on_the_same_thread() {
    let storage = MemoryStore::new();
    let (mut left, _left_rx) = open_tab(&storage, "u1");
    let (mut right, mut right_rx) = open_tab(&storage, "u2");
    let mut left_changes = left.subscribe_changes();
    let mut right_changes = right.subscribe_changes();

    let question = left
        .send_at(OutgoingMessage::text("Le rapport est prêt ?"), at(1))
        .unwrap()
        .unwrap();
    assert!(right.apply_storage_event(&right_changes.try_recv().unwrap()));
    assert_eq!(right_rx.try_recv().unwrap().preview, "Le rapport est prêt ?");

    right
        .send_at(OutgoingMessage::text("Oui").replying_to(&question.id), at(2))
        .unwrap();
    right.toggle_reaction(&question.id, "👍").unwrap();
    while let Some(event) = left_changes.try_recv() {
        left.apply_storage_event(&event);
    }

    assert_eq!(left.messages(), right.messages());
    let reply = &left.display_messages()[1];
    assert_eq!(reply.quoted_message_text.as_deref(), Some("Le rapport est prêt ?"));
    assert!(left.messages()[0].has_reaction("👍", "u2"));
    assert_eq!(left.unread_count(), 1);

    left.delete(&question.id).unwrap();
    right.apply_storage_event(&right_changes.try_recv().unwrap());
    assert_eq!(right.messages()[0].text, DELETED_PLACEHOLDER);
    assert_eq!(right.display_messages().len(), 1);
}

#[test]
fn watermark_moves_unread_count() {
    let storage = MemoryStore::new();
    let (mut sender, _) = open_tab(&storage, "u2");
    let (mut reader, _rx) = open_tab(&storage, "u1");
    let mut changes = reader.subscribe_changes();

    for minute in 1..=3 {
        sender
            .send_at(OutgoingMessage::text(format!("note {minute}")), at(minute))
            .unwrap();
    }
    while let Some(event) = changes.try_recv() {
        reader.apply_storage_event(&event);
    }
    assert_eq!(reader.unread_count(), 3);

    reader
        .mark_as_read_at(None, at(3) + Duration::milliseconds(500))
        .unwrap();
    assert_eq!(reader.unread_count(), 0);

    sender.send_at(OutgoingMessage::text("note 4"), at(4)).unwrap();
    reader.apply_storage_event(&changes.try_recv().unwrap());
    assert_eq!(reader.unread_count(), 1);
}
