//! Home feed: the live event list with category and area selection.

use crate::types::{Category, Event, EventStatus};
use monos_core::{SmallVec, environment::Clock, reducer::Reducer};
use monos_core::effect::Effect;
use std::sync::Arc;

/// Areas offered in the feed's area selector.
pub const AREAS: [&str; 8] = [
    "東京都",
    "神奈川県",
    "埼玉県",
    "千葉県",
    "大阪府",
    "京都府",
    "福岡県",
    "北海道",
];

/// Feed state.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedState {
    /// Current events, newest first, ended events excluded
    pub events: Vec<Event>,
    /// Category filter, `None` meaning all
    pub category: Option<Category>,
    /// Selected browsing area
    pub area: String,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            category: None,
            area: AREAS[0].to_string(),
        }
    }
}

impl FeedState {
    /// Events passing the active category filter, in feed order.
    #[must_use]
    pub fn visible(&self) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|event| self.category.is_none_or(|c| event.category == c))
            .collect()
    }
}

/// Feed actions.
#[derive(Clone, Debug)]
pub enum FeedAction {
    /// A new authoritative snapshot of the event collection arrived
    EventsUpdated(Vec<Event>),
    /// Change the category filter, `None` for all
    SelectCategory(Option<Category>),
    /// Change the browsing area
    SelectArea(String),
}

/// Environment for the feed reducer.
#[derive(Clone)]
pub struct FeedEnvironment {
    /// Clock used to derive event statuses
    pub clock: Arc<dyn Clock>,
}

impl FeedEnvironment {
    /// Creates a new `FeedEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

/// Reducer for the home feed
#[derive(Clone, Debug, Default)]
pub struct FeedReducer;

impl FeedReducer {
    /// Creates a new `FeedReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for FeedReducer {
    type State = FeedState;
    type Action = FeedAction;
    type Environment = FeedEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            FeedAction::EventsUpdated(events) => {
                // Each emission replaces the list wholesale; ended events
                // drop out of the feed.
                let now = env.clock.now();
                state.events = events
                    .into_iter()
                    .filter(|event| event.effective_status(now) != EventStatus::Completed)
                    .collect();
            }
            FeedAction::SelectCategory(category) => {
                state.category = category;
            }
            FeedAction::SelectArea(area) => {
                state.area = area;
            }
        }
        SmallVec::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{DEPOSIT_PER_PERSON, EventId, Level, UserId, Yen};
    use chrono::Duration;
    use monos_testing::{ReducerTest, assertions, mocks::test_clock};

    fn sample(id: &str, category: Category, hours_from_now: i64) -> Event {
        let start = test_clock().now() + Duration::hours(hours_from_now);
        Event {
            id: EventId::new(id),
            title: id.to_string(),
            category,
            description: String::new(),
            start_at: start,
            end_at: start + Duration::hours(3),
            deadline_at: start - Duration::hours(12),
            location_name: "loc".to_string(),
            location_area: "東京都".to_string(),
            capacity: 10,
            current_count: 0,
            price: Yen(500),
            deposit: DEPOSIT_PER_PERSON,
            status: EventStatus::Recruiting,
            tags: vec![],
            image_url: None,
            level: Level::BeginnerWelcome,
            host_id: UserId::new("h1"),
            host_name: "host".to_string(),
            host_photo: None,
            created_at: test_clock().now(),
        }
    }

    fn env() -> FeedEnvironment {
        FeedEnvironment::new(Arc::new(test_clock()))
    }

    #[test]
    fn snapshot_replaces_list_and_drops_ended_events() {
        let upcoming = sample("e1", Category::Sports, 24);
        let ended = sample("e2", Category::Tech, -48);

        ReducerTest::new(FeedReducer::new())
            .with_env(env())
            .given_state(FeedState::default())
            .when_action(FeedAction::EventsUpdated(vec![
                upcoming.clone(),
                ended,
            ]))
            .then_state(move |state| {
                assert_eq!(state.events, vec![upcoming.clone()]);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn category_filter_narrows_visible_events() {
        let mut state = FeedState::default();
        state.events = vec![
            sample("e1", Category::Sports, 24),
            sample("e2", Category::Tech, 24),
        ];
        state.category = Some(Category::Tech);

        let visible = state.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id.as_str(), "e2");

        state.category = None;
        assert_eq!(state.visible().len(), 2);
    }
}
