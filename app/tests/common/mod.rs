//! Shared fixtures for integration tests.

use chrono::{DateTime, Duration, Utc};
use monos::Repo;
use monos::types::{
    Category, DEPOSIT_PER_PERSON, EventId, EventStatus, Level, NewEvent, UserId, Yen,
};
use monos_backend::{DocumentStore, MemoryStore};
use std::sync::Arc;

/// A backend, a typed repo over it, and the concrete store for assertions.
#[allow(dead_code)]
pub struct Fixture {
    pub memory: MemoryStore,
    pub backend: Arc<dyn DocumentStore>,
    pub repo: Repo,
}

#[must_use]
pub fn fixture() -> Fixture {
    let memory = MemoryStore::new();
    let backend: Arc<dyn DocumentStore> = Arc::new(memory.clone());
    let repo = Repo::new(Arc::clone(&backend));
    Fixture {
        memory,
        backend,
        repo,
    }
}

#[must_use]
pub fn new_event(title: &str, price: u64, capacity: u32, current_count: u32) -> NewEvent {
    let start = Utc::now() + Duration::hours(24);
    NewEvent {
        title: title.to_string(),
        category: Category::Sports,
        description: String::new(),
        start_at: start,
        end_at: start + Duration::hours(3),
        deadline_at: start - Duration::hours(12),
        location_name: "代々木公園".to_string(),
        location_area: "東京都".to_string(),
        capacity,
        current_count,
        price: Yen(price),
        deposit: DEPOSIT_PER_PERSON,
        status: EventStatus::Recruiting,
        tags: vec![],
        image_url: None,
        level: Level::BeginnerWelcome,
        host_id: UserId::new("host-1"),
        host_name: "host".to_string(),
        host_photo: None,
    }
}

#[allow(dead_code)]
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

#[allow(dead_code)]
pub async fn seed_event(
    repo: &Repo,
    title: &str,
    price: u64,
    capacity: u32,
    current_count: u32,
) -> EventId {
    repo.create_event(&new_event(title, price, capacity, current_count))
        .await
        .expect("seed event")
}
