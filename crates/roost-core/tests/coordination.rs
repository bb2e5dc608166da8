mod common;

use std::sync::Arc;

use common::*;
use roost_core::{ConversationRegistry, MessageLog, Notifier, SendError, Unavailable};
use roost_db::Database;
use uuid::Uuid;

fn services(db: &Arc<Database>) -> (ConversationRegistry, MessageLog) {
    let notifier = Notifier::new(db.clone());
    (
        ConversationRegistry::new(db.clone()),
        MessageLog::new(db.clone(), notifier),
    )
}

#[tokio::test]
async fn conversation_is_reused_across_argument_orders() {
    let db = memory_db();
    let registry = ConversationRegistry::new(db.clone());
    let a = seed_tenant(&db);
    let b = seed_landlord(&db);

    let first = registry.get_or_create(a, b).await.unwrap();
    let second = registry.get_or_create(b, a).await.unwrap();
    assert_eq!(first, second);

    let found = registry.find(first).await.expect("conversation");
    assert!(found.participant1 < found.participant2);
    assert!(found.has_pair(a, b));
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_get_or_create_converges_on_one_row() {
    let db = memory_db();
    let registry = ConversationRegistry::new(db.clone());
    let a = seed_tenant(&db);
    let b = seed_landlord(&db);

    let (left, right) = tokio::join!(registry.get_or_create(a, b), registry.get_or_create(b, a));
    assert_eq!(left.unwrap(), right.unwrap());

    let count: i64 = db
        .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM conversations", [], |r| r.get(0))?))
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn degenerate_pairs_are_refused_without_io() {
    let db = memory_db();
    let registry = ConversationRegistry::new(db.clone());
    let a = seed_tenant(&db);

    assert_eq!(registry.get_or_create(a, a).await, Err(Unavailable));
    assert_eq!(registry.get_or_create(a, Uuid::nil()).await, Err(Unavailable));
    assert_eq!(registry.get_or_create(Uuid::nil(), a).await, Err(Unavailable));

    let count: i64 = db
        .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM conversations", [], |r| r.get(0))?))
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn send_trims_content_and_refreshes_the_thread() {
    let db = memory_db();
    let (registry, log) = services(&db);
    let a = seed_tenant(&db);
    let b = seed_landlord(&db);
    let conv = registry.get_or_create(a, b).await.unwrap();

    let message = log.send(conv, a, b, "  hello there  ").await.unwrap();
    assert_eq!(message.content, "hello there");
    assert!(!message.read);
    assert_eq!(message.conversation_id, conv);
    assert_eq!(message.sender_id, a);
    assert_eq!(message.receiver_id, b);

    let found = registry.find(conv).await.expect("conversation");
    assert_eq!(found.last_message_id, Some(message.id));
    assert_eq!(found.last_message_at, Some(message.created_at));
}

#[tokio::test]
async fn send_rejects_blank_and_foreign_participants() {
    let db = memory_db();
    let (registry, log) = services(&db);
    let a = seed_tenant(&db);
    let b = seed_landlord(&db);
    let outsider = seed_tenant(&db);
    let conv = registry.get_or_create(a, b).await.unwrap();

    assert!(matches!(
        log.send(conv, a, b, "   \n\t ").await,
        Err(SendError::EmptyContent)
    ));
    assert!(matches!(
        log.send(conv, a, outsider, "hi").await,
        Err(SendError::NotParticipant)
    ));
    assert!(matches!(
        log.send(conv, outsider, b, "hi").await,
        Err(SendError::NotParticipant)
    ));
    assert!(matches!(
        log.send(Uuid::new_v4(), a, b, "hi").await,
        Err(SendError::Unavailable(_))
    ));

    assert!(log.list(conv, 50).await.is_empty());
}

#[tokio::test]
async fn list_returns_the_recent_window_oldest_first() {
    let db = memory_db();
    let (registry, log) = services(&db);
    let a = seed_tenant(&db);
    let b = seed_landlord(&db);
    let conv = registry.get_or_create(a, b).await.unwrap();

    for text in ["one", "two", "three", "four", "five"] {
        log.send(conv, a, b, text).await.unwrap();
    }

    let all = log.list(conv, 50).await;
    let contents: Vec<&str> = all.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "two", "three", "four", "five"]);

    let window = log.list(conv, 2).await;
    let contents: Vec<&str> = window.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["four", "five"]);
}

#[tokio::test]
async fn mark_read_is_idempotent_and_per_receiver() {
    let db = memory_db();
    let (registry, log) = services(&db);
    let a = seed_tenant(&db);
    let b = seed_landlord(&db);
    let conv = registry.get_or_create(a, b).await.unwrap();

    log.send(conv, a, b, "to b, one").await.unwrap();
    log.send(conv, a, b, "to b, two").await.unwrap();
    log.send(conv, b, a, "to a").await.unwrap();

    assert_eq!(log.unread_count(conv, b).await, 2);
    assert_eq!(log.unread_count(conv, a).await, 1);

    assert_eq!(log.mark_read(conv, b).await, Ok(2));
    assert_eq!(log.mark_read(conv, b).await, Ok(0));
    assert_eq!(log.unread_count(conv, b).await, 0);
    assert_eq!(log.unread_count(conv, a).await, 1);

    let read_states: Vec<bool> = log.list(conv, 10).await.iter().map(|m| m.read).collect();
    assert_eq!(read_states, vec![true, true, false]);
}

#[tokio::test]
async fn conversation_list_orders_by_activity_and_drops_unresolvable_peers() {
    let db = memory_db();
    let (registry, log) = services(&db);
    let me = seed_tenant(&db);
    let peer1 = seed_landlord(&db);
    let peer2 = seed_landlord(&db);

    let conv1 = registry.get_or_create(me, peer1).await.unwrap();
    let conv2 = registry.get_or_create(me, peer2).await.unwrap();

    // Timestamps only have second resolution; age the idle thread so the
    // activity ordering is unambiguous.
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE conversations SET created_at = datetime('now', '-1 hour') WHERE id = ?1",
            [conv2.to_string()],
        )?;
        Ok(())
    })
    .unwrap();

    log.send(conv1, peer1, me, "hi").await.unwrap();

    let summaries = registry.list_for_user(me).await;
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].conversation.id, conv1);
    assert_eq!(summaries[0].peer.id, peer1);
    assert_eq!(
        summaries[0].last_message.as_ref().map(|m| m.content.as_str()),
        Some("hi")
    );
    assert_eq!(summaries[0].unread_count, 1);
    assert_eq!(summaries[1].conversation.id, conv2);
    assert!(summaries[1].last_message.is_none());
    assert_eq!(summaries[1].unread_count, 0);

    assert_eq!(log.mark_read(conv1, me).await, Ok(1));
    let summaries = registry.list_for_user(me).await;
    assert_eq!(summaries[0].unread_count, 0);

    // peer2 disappears from the identity store: that row is dropped
    // rather than returned with a hole where the profile belongs.
    db.with_conn(|conn| {
        conn.execute("DELETE FROM users WHERE id = ?1", [peer2.to_string()])?;
        Ok(())
    })
    .unwrap();
    let summaries = registry.list_for_user(me).await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].conversation.id, conv1);
}

#[tokio::test]
async fn storage_failures_degrade_softly() {
    let db = memory_db();
    let (registry, log) = services(&db);
    let a = seed_tenant(&db);
    let b = seed_landlord(&db);
    let conv = registry.get_or_create(a, b).await.unwrap();
    log.send(conv, a, b, "hello").await.unwrap();

    drop_table(&db, "messages");
    assert!(log.list(conv, 50).await.is_empty());
    assert!(matches!(
        log.send(conv, a, b, "again").await,
        Err(SendError::Unavailable(_))
    ));
    assert_eq!(log.mark_read(conv, b).await, Err(Unavailable));
    assert_eq!(log.unread_count(conv, b).await, 0);

    drop_table(&db, "conversations");
    assert_eq!(registry.get_or_create(a, b).await, Err(Unavailable));
    assert!(registry.find(conv).await.is_none());
    assert!(registry.list_for_user(a).await.is_empty());
}
