//! Live event feed: snapshot delivery, ordering, and subscription teardown.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{fixture, new_event, seed_event};
use monos::features::feed::{FeedAction, FeedEnvironment, FeedReducer, FeedState};
use monos::live::{LiveQuery, decode_snapshot};
use monos::queries::{event_feed, hosted_events, joined_rooms};
use monos::types::{Participant, UserId, Yen};
use monos_core::environment::SystemClock;
use monos_runtime::Store;
use std::sync::Arc;
use std::time::Duration;

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn feed_delivers_newest_first_and_tracks_writes() {
    let f = fixture();

    let store = Store::new(
        FeedState::default(),
        FeedReducer::new(),
        FeedEnvironment::new(Arc::new(SystemClock)),
    );
    let live = LiveQuery::open(f.backend.as_ref(), event_feed(), store.clone(), |snap| {
        FeedAction::EventsUpdated(decode_snapshot(snap))
    });

    seed_event(&f.repo, "first", 500, 12, 0).await;
    seed_event(&f.repo, "second", 500, 12, 0).await;
    settle().await;

    let titles = store
        .state(|s| s.events.iter().map(|e| e.title.clone()).collect::<Vec<_>>())
        .await;
    assert_eq!(titles, vec!["second", "first"]);

    seed_event(&f.repo, "third", 500, 12, 0).await;
    settle().await;
    let first_title = store.state(|s| s.events[0].title.clone()).await;
    assert_eq!(first_title, "third");

    assert_eq!(f.memory.active_subscriptions(), 1);
    drop(live);
    settle().await;
    assert_eq!(f.memory.active_subscriptions(), 0);
}

#[tokio::test]
async fn hosted_filter_only_sees_own_events() {
    let f = fixture();

    let mut other = new_event("someone elses", 500, 12, 0);
    other.host_id = UserId::new("host-2");
    f.repo.create_event(&other).await.unwrap();
    seed_event(&f.repo, "mine", 500, 12, 0).await;

    let mut sub = f.backend.subscribe(hosted_events(&UserId::new("host-1")));
    let snapshot = sub.next().await.unwrap();
    let events: Vec<monos::types::Event> = decode_snapshot(snapshot);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "mine");
}

#[tokio::test]
async fn joined_rooms_list_participation_records() {
    let f = fixture();
    let event_id = seed_event(&f.repo, "molkky", 500, 12, 0).await;

    f.repo
        .join_event(
            &event_id,
            &Participant {
                event_id: event_id.clone(),
                user_id: UserId::new("user-1"),
                guest_count: 0,
                total_fee: Yen(500),
                total_deposit: Yen(50),
            },
        )
        .await
        .unwrap();

    let mut sub = f.backend.subscribe(joined_rooms(&UserId::new("user-1")));
    let snapshot = sub.next().await.unwrap();
    let records: Vec<Participant> = decode_snapshot(snapshot);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event_id, event_id);
}
