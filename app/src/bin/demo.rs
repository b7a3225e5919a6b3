//! Demo driver: wires the in-memory backend, seeds demo events, and walks a
//! user through signing in, reserving a seat, and chatting.

use monos::config::Config;
use monos::features::chat::ChatRoom;
use monos::features::feed::{FeedAction, FeedEnvironment, FeedReducer, FeedState};
use monos::features::reservation::{
    ReservationAction, ReservationEnvironment, ReservationReducer, ReservationState, Step,
};
use monos::live::{LiveQuery, decode_snapshot};
use monos::queries::event_feed;
use monos::types::{Event, GuestCount};
use monos::Repo;
use monos_backend::{AuthProvider, DocumentStore, Identity, LocalAuth, MemoryStore};
use monos_core::environment::{Clock, SystemClock};
use monos_runtime::Store;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting MONOs demo");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let backend: Arc<dyn DocumentStore> = Arc::new(MemoryStore::with_clock(Arc::clone(&clock)));
    let repo = Repo::new(Arc::clone(&backend));

    if config.seed_demo_data {
        monos::seed::seed(&repo, clock.now()).await?;
    }

    // Sign the demo user in.
    let auth: Arc<dyn AuthProvider> = Arc::new(LocalAuth::new(Identity {
        uid: config.demo_user.clone(),
        display_name: Some(config.demo_user_name.clone()),
        photo_url: None,
    }));
    let user = auth.sign_in().await?;
    info!(uid = %user.uid, "signed in");

    // Open the home feed and wait for the seeded events.
    let feed = Store::new(
        FeedState::default(),
        FeedReducer::new(),
        FeedEnvironment::new(Arc::clone(&clock)),
    );
    let _feed_live = LiveQuery::open(backend.as_ref(), event_feed(), feed.clone(), |snapshot| {
        FeedAction::EventsUpdated(decode_snapshot(snapshot))
    });

    let event = wait_for_feed(&feed).await?;
    info!(title = %event.title, seats_left = event.seats_left(), "picked an event");

    // Walk the reservation wizard: confirm with one guest, commit at payment.
    let reservation = Store::new(
        ReservationState::default(),
        ReservationReducer::new(),
        ReservationEnvironment::new(repo.clone(), user.clone()),
    );
    reservation
        .send(ReservationAction::Open(event.clone()))
        .await?;
    reservation
        .send(ReservationAction::SelectGuests(
            GuestCount::new(1).ok_or_else(|| anyhow::anyhow!("invalid guest count"))?,
        ))
        .await?;
    if let Some(quote) = reservation.state(ReservationState::quote).await {
        info!(fee = %quote.total_fee, deposit = %quote.total_deposit, due = %quote.total_due, "quoted");
    }
    reservation.send(ReservationAction::Proceed).await?;
    let outcome = reservation
        .send_and_wait_for(
            ReservationAction::ConfirmPayment,
            |action| {
                matches!(
                    action,
                    ReservationAction::JoinSucceeded | ReservationAction::JoinFailed(_)
                )
            },
            Duration::from_secs(5),
        )
        .await?;
    info!(?outcome, "reservation settled");

    let step = reservation.state(|s| s.step).await;
    anyhow::ensure!(step == Step::Success, "reservation did not reach success");

    // Chat in the event's room.
    let room = ChatRoom::open(
        &backend,
        repo.clone(),
        Arc::clone(&auth),
        event.id.clone(),
        event.title.clone(),
    );
    room.send_message("よろしくお願いします!").await?;

    // Give the live subscription a beat to deliver the message.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let messages = room.store().state(|s| s.messages.clone()).await;
    for message in &messages {
        info!(sender = %message.sender_name, text = %message.text, "chat");
    }

    let joined = repo.fetch_event(&event.id).await?;
    info!(
        current_count = joined.current_count,
        capacity = joined.capacity,
        "final event state"
    );

    Ok(())
}

async fn wait_for_feed(
    feed: &Store<FeedState, FeedAction, FeedEnvironment, FeedReducer>,
) -> anyhow::Result<Event> {
    for _ in 0..50 {
        if let Some(event) = feed
            .state(|s| s.events.iter().find(|e| !e.is_full()).cloned())
            .await
        {
            return Ok(event);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    anyhow::bail!("feed never delivered events")
}
