//! Chat room listing: the rooms a user hosts and the rooms they joined.
//!
//! The two listing modes are deliberately separate capabilities; neither is
//! derived from the other.

use crate::types::{Event, Participant};
use monos_core::{SmallVec, effect::Effect, reducer::Reducer};

/// Room listing state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoomsState {
    /// Events the user hosts, newest first
    pub hosted: Vec<Event>,
    /// The user's participation records, newest first
    pub joined: Vec<Participant>,
}

/// Room listing actions.
#[derive(Clone, Debug)]
pub enum RoomsAction {
    /// Snapshot of the user's hosted events
    HostedUpdated(Vec<Event>),
    /// Snapshot of the user's participation records
    JoinedUpdated(Vec<Participant>),
}

/// Reducer for the room listing
#[derive(Clone, Debug, Default)]
pub struct RoomsReducer;

impl RoomsReducer {
    /// Creates a new `RoomsReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for RoomsReducer {
    type State = RoomsState;
    type Action = RoomsAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            RoomsAction::HostedUpdated(events) => state.hosted = events,
            RoomsAction::JoinedUpdated(records) => state.joined = records,
        }
        SmallVec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventId, UserId, Yen};
    use monos_testing::{ReducerTest, assertions};

    #[test]
    fn hosted_and_joined_update_independently() {
        let record = Participant {
            event_id: EventId::new("e1"),
            user_id: UserId::new("u1"),
            guest_count: 0,
            total_fee: Yen(500),
            total_deposit: Yen(50),
        };
        let expected = record.clone();

        ReducerTest::new(RoomsReducer::new())
            .with_env(())
            .given_state(RoomsState::default())
            .when_action(RoomsAction::JoinedUpdated(vec![record]))
            .then_state(move |state| {
                assert!(state.hosted.is_empty());
                assert_eq!(state.joined, vec![expected.clone()]);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }
}
