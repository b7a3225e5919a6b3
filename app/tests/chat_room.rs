//! Chat room: cross-sender ordering and send rejection.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{fixture, seed_event};
use monos::features::chat::{ChatAction, ChatRoom};
use monos_backend::{AuthProvider, Identity, LocalAuth};
use std::sync::Arc;
use std::time::Duration;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

fn signed_in(uid: &str, name: &str) -> Arc<dyn AuthProvider> {
    Arc::new(LocalAuth::signed_in(Identity {
        uid: uid.to_string(),
        display_name: Some(name.to_string()),
        photo_url: None,
    }))
}

#[tokio::test]
async fn two_senders_see_one_ascending_order() {
    let f = fixture();
    let event_id = seed_event(&f.repo, "molkky", 500, 12, 0).await;

    let room_a = ChatRoom::open(
        &f.backend,
        f.repo.clone(),
        signed_in("user-a", "太郎"),
        event_id.clone(),
        "molkky".to_string(),
    );
    let room_b = ChatRoom::open(
        &f.backend,
        f.repo.clone(),
        signed_in("user-b", "花子"),
        event_id.clone(),
        "molkky".to_string(),
    );

    room_a.send_message("こんにちは").await.unwrap();
    settle().await;
    room_b.send_message("よろしく").await.unwrap();
    settle().await;
    room_a.send_message("当日よろしくお願いします").await.unwrap();
    settle().await;

    // Both rooms converge on the same server-ordered history.
    for room in [&room_a, &room_b] {
        let messages = room.store().state(|s| s.messages.clone()).await;
        assert_eq!(messages.len(), 3);
        let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["こんにちは", "よろしく", "当日よろしくお願いします"]
        );
        assert!(
            messages
                .windows(2)
                .all(|pair| pair[0].created_at <= pair[1].created_at)
        );
    }
}

#[tokio::test]
async fn whitespace_only_send_leaves_stream_unchanged() {
    let f = fixture();
    let event_id = seed_event(&f.repo, "molkky", 500, 12, 0).await;

    let room = ChatRoom::open(
        &f.backend,
        f.repo.clone(),
        signed_in("user-a", "太郎"),
        event_id.clone(),
        "molkky".to_string(),
    );

    room.send_message("最初の一言").await.unwrap();
    settle().await;
    room.send_message("   \n\t").await.unwrap();
    settle().await;

    let messages = room.store().state(|s| s.messages.clone()).await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "最初の一言");
}

#[tokio::test]
async fn unauthenticated_send_records_error_and_appends_nothing() {
    let f = fixture();
    let event_id = seed_event(&f.repo, "molkky", 500, 12, 0).await;

    let auth: Arc<dyn AuthProvider> = Arc::new(LocalAuth::new(Identity::new("user-a")));
    let room = ChatRoom::open(
        &f.backend,
        f.repo.clone(),
        auth,
        event_id.clone(),
        "molkky".to_string(),
    );

    room.store()
        .send(ChatAction::SendMessage("こんにちは".to_string()))
        .await
        .unwrap();
    settle().await;

    let (messages, error) = room
        .store()
        .state(|s| (s.messages.clone(), s.last_error.clone()))
        .await;
    assert!(messages.is_empty());
    assert!(error.is_some());
}
