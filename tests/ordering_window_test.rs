mod common;

use std::time::Duration;

use futures_util::StreamExt;
use tokio::time::timeout;

use chat_core::services::message_log::MessageLog;
use chat_core::UserId;

use common::{harness, open_session};

#[tokio::test]
async fn sequential_sends_are_observed_in_issue_order() {
    let h = harness();
    let session = open_session(&h.state, "u1", "u2").await;

    for i in 0..5 {
        session.send(&format!("msg {i}"), None).await.unwrap();
    }

    let log = MessageLog::new(h.state.store.clone());
    let window = log.recent(session.conversation_id().unwrap()).await.unwrap();
    // Newest first; reversed gives issue order.
    let issued: Vec<&str> = window.iter().rev().map(|m| m.text.as_str()).collect();
    assert_eq!(issued, vec!["msg 0", "msg 1", "msg 2", "msg 3", "msg 4"]);
    for pair in window.windows(2) {
        assert!(pair[0].created_at > pair[1].created_at);
    }
}

#[tokio::test]
async fn subscription_window_is_bounded_at_fifty() {
    let h = harness();
    let session = open_session(&h.state, "u1", "u2").await;
    let cid = session.conversation_id().unwrap().clone();

    for i in 1..=60 {
        session.send(&format!("m{i}"), None).await.unwrap();
    }

    let log = MessageLog::new(h.state.store.clone());
    let mut sub = log.subscribe(&cid, 50).await.unwrap();
    let window = sub.next_window().await.unwrap();
    assert_eq!(window.len(), 50);
    assert_eq!(window.first().unwrap().text, "m60");
    assert_eq!(window.last().unwrap().text, "m11");
    assert!(!window.iter().any(|m| m.text == "m10"));
}

#[tokio::test]
async fn live_subscription_reemits_the_full_window_per_change() {
    let h = harness();
    let a = open_session(&h.state, "u1", "u2").await;
    let mut b = open_session(&h.state, "u2", "u1").await;

    // Initial emission is the current (empty) window.
    let initial = b.next_window().await.unwrap();
    assert!(initial.is_empty());

    a.send("first", None).await.unwrap();
    let window = timeout(Duration::from_secs(1), b.next_window())
        .await
        .expect("change tick")
        .unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].text, "first");
    assert_eq!(window[0].sender_id, UserId::from("u1"));

    a.send("second", None).await.unwrap();
    let window = timeout(Duration::from_secs(1), b.next_window())
        .await
        .expect("change tick")
        .unwrap();
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].text, "second");
}

#[tokio::test]
async fn concurrent_sends_from_both_sides_both_persist() {
    let h = harness();
    let a = open_session(&h.state, "u1", "u2").await;
    let b = open_session(&h.state, "u2", "u1").await;
    let cid = a.conversation_id().unwrap().clone();

    let (ra, rb) = tokio::join!(a.send("from u1", None), b.send("from u2", None));
    ra.unwrap();
    rb.unwrap();

    // A third observer sees both, ordered by server timestamp.
    let log = MessageLog::new(h.state.store.clone());
    let window = log.recent(&cid).await.unwrap();
    assert_eq!(window.len(), 2);
    assert!(window[0].created_at > window[1].created_at);
    let mut senders: Vec<&str> = window.iter().map(|m| m.sender_id.as_str()).collect();
    senders.sort_unstable();
    assert_eq!(senders, vec!["u1", "u2"]);
}

#[tokio::test]
async fn subscription_stream_surface_works_with_stream_combinators() {
    let h = harness();
    let session = open_session(&h.state, "u1", "u2").await;
    let cid = session.conversation_id().unwrap().clone();
    session.send("hello", None).await.unwrap();

    let log = MessageLog::new(h.state.store.clone());
    let sub = log.subscribe(&cid, 50).await.unwrap();
    let mut stream = Box::pin(sub.into_stream());
    let first = timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("initial emission")
        .unwrap()
        .unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].text, "hello");
}

#[tokio::test]
async fn fresh_subscription_redelivers_the_current_window() {
    let h = harness();
    let session = open_session(&h.state, "u1", "u2").await;
    let cid = session.conversation_id().unwrap().clone();
    session.send("durable", None).await.unwrap();

    // Simulates the re-open after a lost subscription: the current window is
    // served again, nothing is buffered or lost inside it.
    let log = MessageLog::new(h.state.store.clone());
    let mut first = log.subscribe(&cid, 50).await.unwrap();
    let mut second = log.subscribe(&cid, 50).await.unwrap();
    assert_eq!(first.next_window().await.unwrap().len(), 1);
    assert_eq!(second.next_window().await.unwrap().len(), 1);
}
