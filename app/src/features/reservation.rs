//! Reservation flow: confirm → payment → success for joining one event.
//!
//! The flow is a linear wizard with one backward edge (payment back to
//! confirm). The only durable effect is the capacity-guarded join committed
//! at the payment step; the wizard moves to success strictly on the
//! backend's confirmation, never optimistically.

use crate::repo::{JoinError, Repo};
use crate::types::{Event, GuestCount, Participant, ReservationQuote, quote};
use monos_backend::Identity;
use monos_core::{SmallVec, effect::Effect, reducer::Reducer};

/// Wizard step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Step {
    /// Review the event and pick a party size
    #[default]
    Confirm,
    /// Enter (mock) payment details and commit
    Payment,
    /// Reservation committed
    Success,
}

/// Why a commit attempt failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReservationFailure {
    /// The event filled up before the commit landed
    EventFull,
    /// Any other backend failure; the user may retry manually
    Backend(String),
}

/// Reservation wizard state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReservationState {
    /// The event being joined, present while the wizard is open
    pub event: Option<Event>,
    /// Current step
    pub step: Step,
    /// Additional attendees
    pub guest_count: GuestCount,
    /// A commit is in flight; the confirm control must be disabled
    pub submitting: bool,
    /// Last commit failure
    pub last_error: Option<ReservationFailure>,
}

impl ReservationState {
    /// Totals at the current party size, `None` when the wizard is closed.
    #[must_use]
    pub fn quote(&self) -> Option<ReservationQuote> {
        self.event
            .as_ref()
            .map(|event| quote(event.price, self.guest_count))
    }
}

/// Reservation actions.
#[derive(Clone, Debug)]
pub enum ReservationAction {
    /// Open the wizard for an event, always starting at confirm with no guests
    Open(Event),
    /// Pick a party size
    SelectGuests(GuestCount),
    /// Confirm → payment
    Proceed,
    /// Payment → confirm
    Back,
    /// Commit the reservation
    ConfirmPayment,
    /// The backend committed the join
    JoinSucceeded,
    /// The commit failed; stay on the payment step
    JoinFailed(ReservationFailure),
    /// Close or cancel at any step, discarding the draft
    Close,
}

/// Environment for the reservation reducer.
#[derive(Clone)]
pub struct ReservationEnvironment {
    /// Typed storage access
    pub repo: Repo,
    /// The reserving user
    pub user: Identity,
}

impl ReservationEnvironment {
    /// Creates a new `ReservationEnvironment`
    #[must_use]
    pub const fn new(repo: Repo, user: Identity) -> Self {
        Self { repo, user }
    }
}

/// Reducer for the reservation wizard
#[derive(Clone, Debug, Default)]
pub struct ReservationReducer;

impl ReservationReducer {
    /// Creates a new `ReservationReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for ReservationReducer {
    type State = ReservationState;
    type Action = ReservationAction;
    type Environment = ReservationEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ReservationAction::Open(event) => {
                *state = ReservationState {
                    event: Some(event),
                    ..ReservationState::default()
                };
                SmallVec::new()
            }
            ReservationAction::SelectGuests(guest_count) => {
                if state.step == Step::Confirm {
                    state.guest_count = guest_count;
                }
                SmallVec::new()
            }
            ReservationAction::Proceed => {
                if state.step == Step::Confirm && state.event.is_some() {
                    state.step = Step::Payment;
                }
                SmallVec::new()
            }
            ReservationAction::Back => {
                if state.step == Step::Payment && !state.submitting {
                    state.step = Step::Confirm;
                }
                SmallVec::new()
            }
            ReservationAction::ConfirmPayment => {
                if state.step != Step::Payment || state.submitting {
                    return SmallVec::new();
                }
                let Some(event) = state.event.clone() else {
                    return SmallVec::new();
                };

                state.submitting = true;
                state.last_error = None;

                let totals = quote(event.price, state.guest_count);
                let participant = Participant {
                    event_id: event.id.clone(),
                    user_id: crate::types::UserId::new(env.user.uid.clone()),
                    guest_count: state.guest_count.get(),
                    total_fee: totals.total_fee,
                    total_deposit: totals.total_deposit,
                };
                let repo = env.repo.clone();

                monos_core::smallvec![Effect::future(async move {
                    match repo.join_event(&event.id, &participant).await {
                        Ok(()) => Some(ReservationAction::JoinSucceeded),
                        Err(JoinError::EventFull) => Some(ReservationAction::JoinFailed(
                            ReservationFailure::EventFull,
                        )),
                        Err(JoinError::Other(e)) => Some(ReservationAction::JoinFailed(
                            ReservationFailure::Backend(e.to_string()),
                        )),
                    }
                })]
            }
            ReservationAction::JoinSucceeded => {
                state.submitting = false;
                state.step = Step::Success;
                SmallVec::new()
            }
            ReservationAction::JoinFailed(failure) => {
                state.submitting = false;
                state.last_error = Some(failure);
                SmallVec::new()
            }
            ReservationAction::Close => {
                // Closing at any step discards the draft entirely.
                *state = ReservationState::default();
                SmallVec::new()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{DEPOSIT_PER_PERSON, Category, EventId, EventStatus, Level, UserId, Yen};
    use chrono::Duration;
    use monos_backend::MemoryStore;
    use monos_core::environment::Clock;
    use monos_testing::{ReducerTest, assertions, mocks::test_clock};
    use std::sync::Arc;

    fn sample_event() -> Event {
        let start = test_clock().now() + Duration::hours(24);
        Event {
            id: EventId::new("e1"),
            title: "molkky".to_string(),
            category: Category::Sports,
            description: String::new(),
            start_at: start,
            end_at: start + Duration::hours(3),
            deadline_at: start - Duration::hours(12),
            location_name: "代々木公園".to_string(),
            location_area: "東京都".to_string(),
            capacity: 12,
            current_count: 4,
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

    fn env() -> ReservationEnvironment {
        ReservationEnvironment::new(
            Repo::new(Arc::new(MemoryStore::new())),
            Identity::new("user-1"),
        )
    }

    fn open_state(step: Step) -> ReservationState {
        ReservationState {
            event: Some(sample_event()),
            step,
            ..ReservationState::default()
        }
    }

    #[test]
    fn open_always_starts_at_confirm_with_zero_guests() {
        let dirty = ReservationState {
            event: Some(sample_event()),
            step: Step::Payment,
            guest_count: GuestCount::new(2).unwrap(),
            submitting: false,
            last_error: Some(ReservationFailure::EventFull),
        };

        ReducerTest::new(ReservationReducer::new())
            .with_env(env())
            .given_state(dirty)
            .when_action(ReservationAction::Open(sample_event()))
            .then_state(|state| {
                assert_eq!(state.step, Step::Confirm);
                assert_eq!(state.guest_count, GuestCount::default());
                assert!(state.last_error.is_none());
            })
            .run();
    }

    #[test]
    fn quote_for_one_guest_matches_pricing() {
        let mut state = open_state(Step::Confirm);
        state.guest_count = GuestCount::new(1).unwrap();
        let q = state.quote().unwrap();
        assert_eq!(q.total_fee, Yen(1000));
        assert_eq!(q.total_deposit, Yen(100));
        assert_eq!(q.total_due, Yen(1100));
    }

    #[test]
    fn confirm_payment_produces_commit_effect_and_suspends_controls() {
        ReducerTest::new(ReservationReducer::new())
            .with_env(env())
            .given_state(open_state(Step::Payment))
            .when_action(ReservationAction::ConfirmPayment)
            .then_state(|state| {
                assert!(state.submitting);
                // Not success until the backend confirms.
                assert_eq!(state.step, Step::Payment);
            })
            .then_effects(|effects| {
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn confirm_payment_while_submitting_is_ignored() {
        let mut state = open_state(Step::Payment);
        state.submitting = true;

        ReducerTest::new(ReservationReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(ReservationAction::ConfirmPayment)
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn join_failure_stays_on_payment_with_distinct_full_error() {
        let mut state = open_state(Step::Payment);
        state.submitting = true;

        ReducerTest::new(ReservationReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(ReservationAction::JoinFailed(ReservationFailure::EventFull))
            .then_state(|state| {
                assert_eq!(state.step, Step::Payment);
                assert!(!state.submitting);
                assert_eq!(state.last_error, Some(ReservationFailure::EventFull));
            })
            .run();
    }

    #[test]
    fn success_has_no_backward_edge() {
        ReducerTest::new(ReservationReducer::new())
            .with_env(env())
            .given_state(open_state(Step::Success))
            .when_action(ReservationAction::Back)
            .then_state(|state| assert_eq!(state.step, Step::Success))
            .run();
    }

    #[test]
    fn close_resets_step_and_guest_count() {
        let mut state = open_state(Step::Payment);
        state.guest_count = GuestCount::new(3).unwrap();

        ReducerTest::new(ReservationReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(ReservationAction::Close)
            .then_state(|state| {
                assert_eq!(*state, ReservationState::default());
            })
            .run();
    }
}
