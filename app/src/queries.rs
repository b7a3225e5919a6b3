//! Query builders for the live collections the views subscribe to.

use crate::repo::{EVENTS, PARTICIPANTS, messages_collection};
use crate::types::{EventId, UserId};
use monos_backend::{Direction, QuerySpec};

/// The home feed: all events, newest first.
#[must_use]
pub fn event_feed() -> QuerySpec {
    QuerySpec::new(EVENTS, "createdAt", Direction::Descending)
}

/// Events hosted by `user`, newest first. Also the host-side room listing.
#[must_use]
pub fn hosted_events(user: &UserId) -> QuerySpec {
    QuerySpec::new(EVENTS, "createdAt", Direction::Descending)
        .where_eq("hostId", user.as_str())
}

/// Participation records for `user`, newest first: the joined-side room
/// listing, a separate capability from [`hosted_events`].
#[must_use]
pub fn joined_rooms(user: &UserId) -> QuerySpec {
    QuerySpec::new(PARTICIPANTS, "createdAt", Direction::Descending)
        .where_eq("userId", user.as_str())
}

/// One event's messages, ascending by the server-assigned timestamp.
#[must_use]
pub fn event_messages(event_id: &EventId) -> QuerySpec {
    QuerySpec::new(
        messages_collection(event_id),
        "createdAt",
        Direction::Ascending,
    )
}
