mod common;

use std::time::Duration;

use tokio::time::timeout;

use chat_core::models::message::ATTACHMENT_PREVIEW;
use chat_core::store::DocumentStore;
use chat_core::{ConversationDirectory, UserId};

use common::{harness, open_session, profile};

#[tokio::test]
async fn list_orders_by_last_activity_descending() {
    let h = harness();
    let with_u2 = open_session(&h.state, "u1", "u2").await;
    let with_u3 = open_session(&h.state, "u1", "u3").await;

    with_u2.send("to u2", None).await.unwrap();
    with_u3.send("to u3", None).await.unwrap();

    let directory = ConversationDirectory::new(h.state.store.clone());
    let list = directory.list_for_user(&UserId::from("u1")).await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id.as_str(), "u1_u3");
    assert_eq!(list[1].id.as_str(), "u1_u2");

    // Activity in the older conversation moves it back to the top.
    with_u2.send("again", None).await.unwrap();
    let list = directory.list_for_user(&UserId::from("u1")).await.unwrap();
    assert_eq!(list[0].id.as_str(), "u1_u2");
    assert_eq!(list[0].last_message_preview, "again");
}

#[tokio::test]
async fn unread_badge_counts_only_the_recipient() {
    let h = harness();
    let a = open_session(&h.state, "u1", "u2").await;
    let b = open_session(&h.state, "u2", "u1").await;

    a.send("one", None).await.unwrap();
    a.send("two", None).await.unwrap();
    b.send("reply", None).await.unwrap();

    let directory = ConversationDirectory::new(h.state.store.clone());
    let for_b = directory.list_for_user(&UserId::from("u2")).await.unwrap();
    assert_eq!(for_b[0].unread_for(&UserId::from("u2")), 2);
    let for_a = directory.list_for_user(&UserId::from("u1")).await.unwrap();
    assert_eq!(for_a[0].unread_for(&UserId::from("u1")), 1);
}

#[tokio::test]
async fn reset_racing_an_increment_settles_at_one() {
    let h = harness();
    let a = open_session(&h.state, "u1", "u2").await;
    let b = open_session(&h.state, "u2", "u1").await;
    let cid = a.conversation_id().unwrap().clone();

    a.send("ping", None).await.unwrap();
    // B acknowledges while A's next send is landing; the late increment wins
    // and the badge shows 1. Accepted eventual-consistency outcome.
    let (reset, send) = tokio::join!(b.mark_read(), a.send("pong", None));
    reset.unwrap();
    send.unwrap();

    let conv = h.state.store.get_conversation(&cid).await.unwrap().unwrap();
    let badge = conv.unread_for(&UserId::from("u2"));
    assert!(badge <= 2, "badge never exceeds the unacknowledged sends");
    b.mark_read().await.unwrap();
    a.send("settle", None).await.unwrap();
    let conv = h.state.store.get_conversation(&cid).await.unwrap().unwrap();
    assert_eq!(conv.unread_for(&UserId::from("u2")), 1);
}

#[tokio::test]
async fn pre_created_conversation_appears_with_zero_messages() {
    let h = harness();
    let session = open_session(&h.state, "u1", "u2").await;

    let directory = ConversationDirectory::new(h.state.store.clone());
    let list = directory.list_for_user(&UserId::from("u2")).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, *session.conversation_id().unwrap());
    assert_eq!(list[0].unread_for(&UserId::from("u2")), 0);
    assert!(list[0].last_message_preview.is_empty());
}

#[tokio::test]
async fn sender_profile_snapshot_is_cached_on_send() {
    let h = harness();
    h.profiles
        .insert(UserId::from("u1"), profile("alice"))
        .await;
    let session = open_session(&h.state, "u1", "u2").await;
    session.send("hello", None).await.unwrap();

    let conv = h
        .state
        .store
        .get_conversation(session.conversation_id().unwrap())
        .await
        .unwrap()
        .unwrap();
    let cached = &conv.participant_info[&UserId::from("u1")];
    assert_eq!(cached.display_name, "alice");
    assert_eq!(
        cached.avatar_url.as_deref(),
        Some("https://cdn.example/alice.png")
    );
}

#[tokio::test]
async fn attachment_only_message_shows_placeholder_in_the_list() {
    let h = harness();
    let session = open_session(&h.state, "u1", "u2").await;
    session
        .send("", Some((bytes::Bytes::from_static(b"img"), "image/png")))
        .await
        .unwrap();

    let directory = ConversationDirectory::new(h.state.store.clone());
    let list = directory.list_for_user(&UserId::from("u2")).await.unwrap();
    assert_eq!(list[0].last_message_preview, ATTACHMENT_PREVIEW);
}

#[tokio::test]
async fn directory_subscription_follows_activity() {
    let h = harness();
    let directory = ConversationDirectory::new(h.state.store.clone());
    let mut sub = directory.subscribe(&UserId::from("u2")).await.unwrap();
    assert!(sub.next_list().await.unwrap().is_empty());

    let session = open_session(&h.state, "u1", "u2").await;
    let list = timeout(Duration::from_secs(1), sub.next_list())
        .await
        .expect("tick on conversation creation")
        .unwrap();
    assert_eq!(list.len(), 1);

    session.send("hello", None).await.unwrap();
    let list = timeout(Duration::from_secs(1), sub.next_list())
        .await
        .expect("tick on send")
        .unwrap();
    assert_eq!(list[0].last_message_preview, "hello");
    assert_eq!(list[0].unread_for(&UserId::from("u2")), 1);
}
