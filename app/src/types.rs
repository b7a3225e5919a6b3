//! Domain types for MONOs events, reservations, chat, and profiles.
//!
//! Serialized field names follow the stored document shape
//! (`camelCase`, timestamps as epoch milliseconds) so documents written by
//! any client version of the app stay readable.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed refundable deposit per participant, in yen. Not user-editable.
pub const DEPOSIT_PER_PERSON: Yen = Yen(50);

/// An amount of money in whole yen.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Yen(pub u64);

impl Yen {
    /// Multiply by a head count.
    #[must_use]
    pub const fn times(self, n: u64) -> Self {
        Self(self.0 * n)
    }
}

impl fmt::Display for Yen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "¥{}", self.0)
    }
}

impl std::ops::Add for Yen {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

/// Identifier of an event document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a user (the auth provider's subject id).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a chat message document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

/// Event category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Sports and outdoor games
    Sports,
    /// Making things (DIY, electronics, crafts)
    Monozukuri,
    /// Board games
    Boardgame,
    /// Outdoor activities
    Outdoor,
    /// Technology meetups
    Tech,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Self; 5] = [
        Self::Sports,
        Self::Monozukuri,
        Self::Boardgame,
        Self::Outdoor,
        Self::Tech,
    ];

    /// The stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sports => "sports",
            Self::Monozukuri => "monozukuri",
            Self::Boardgame => "boardgame",
            Self::Outdoor => "outdoor",
            Self::Tech => "tech",
        }
    }
}

/// Expected experience level, stored in its Japanese display form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    /// 初心者歓迎
    #[serde(rename = "初心者歓迎")]
    BeginnerWelcome,
    /// 経験者向け
    #[serde(rename = "経験者向け")]
    Experienced,
    /// ガチ勢のみ
    #[serde(rename = "ガチ勢のみ")]
    HardcoreOnly,
}

/// Stored recruitment status of an event.
///
/// The stored field never moves off `Recruiting` on its own; closing at the
/// deadline or at capacity is computed on read via
/// [`Event::effective_status`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Accepting reservations
    Recruiting,
    /// No longer accepting reservations
    Closed,
    /// The event has ended
    Completed,
}

/// Number of additional attendees beyond the reserving user, capped at 3.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct GuestCount(u8);

impl GuestCount {
    /// Largest selectable guest count.
    pub const MAX: u8 = 3;

    /// Validate a raw count, `None` when above [`Self::MAX`].
    #[must_use]
    pub const fn new(count: u8) -> Option<Self> {
        if count <= Self::MAX {
            Some(Self(count))
        } else {
            None
        }
    }

    /// The raw guest count.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Total party size including the reserving user.
    #[must_use]
    pub const fn party_size(self) -> u64 {
        1 + self.0 as u64
    }
}

/// A hostable, joinable social gathering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Storage-assigned identifier
    pub id: EventId,
    /// Event title
    pub title: String,
    /// Category
    pub category: Category,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// When the event starts
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_at: DateTime<Utc>,
    /// When the event ends, strictly after `start_at`
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_at: DateTime<Utc>,
    /// Reservation deadline, defaulting to 24h before `start_at`
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub deadline_at: DateTime<Utc>,
    /// Venue name
    pub location_name: String,
    /// Region the event takes place in
    pub location_area: String,
    /// Maximum number of participants, at least 2
    pub capacity: u32,
    /// Current number of confirmed participants
    pub current_count: u32,
    /// Participation fee per person
    pub price: Yen,
    /// Refundable deposit per person
    pub deposit: Yen,
    /// Stored recruitment status
    pub status: EventStatus,
    /// Free-text tags, unique within the event
    #[serde(default)]
    pub tags: Vec<String>,
    /// Cover image URL, if one was attached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Expected experience level
    pub level: Level,
    /// The hosting user's id
    pub host_id: UserId,
    /// The host's display name at creation time
    pub host_name: String,
    /// The host's avatar URL at creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_photo: Option<String>,
    /// Server-assigned creation timestamp
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Whether no further participants fit.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.current_count >= self.capacity
    }

    /// Remaining open seats.
    #[must_use]
    pub const fn seats_left(&self) -> u32 {
        self.capacity.saturating_sub(self.current_count)
    }

    /// The status as of `now`, derived without mutating the stored field:
    /// `Completed` once the event has ended, `Closed` once the deadline has
    /// passed or the event is full, otherwise the stored status.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> EventStatus {
        if now > self.end_at {
            EventStatus::Completed
        } else if now > self.deadline_at || self.is_full() {
            EventStatus::Closed
        } else {
            self.status
        }
    }
}

/// Fields for a not-yet-persisted event. `created_at` and the id are
/// assigned by the store.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    /// Event title
    pub title: String,
    /// Category
    pub category: Category,
    /// Free-form description
    pub description: String,
    /// When the event starts
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_at: DateTime<Utc>,
    /// When the event ends
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_at: DateTime<Utc>,
    /// Reservation deadline
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub deadline_at: DateTime<Utc>,
    /// Venue name
    pub location_name: String,
    /// Region the event takes place in
    pub location_area: String,
    /// Maximum number of participants
    pub capacity: u32,
    /// Current number of confirmed participants, zero at creation
    pub current_count: u32,
    /// Participation fee per person
    pub price: Yen,
    /// Refundable deposit per person
    pub deposit: Yen,
    /// Stored recruitment status
    pub status: EventStatus,
    /// Free-text tags
    pub tags: Vec<String>,
    /// Cover image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Expected experience level
    pub level: Level,
    /// The hosting user's id
    pub host_id: UserId,
    /// The host's display name
    pub host_name: String,
    /// The host's avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_photo: Option<String>,
}

/// Default reservation deadline: 24 hours before the start.
#[must_use]
pub fn default_deadline(start_at: DateTime<Utc>) -> DateTime<Utc> {
    start_at - Duration::hours(24)
}

/// Totals for one reservation at a given party size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReservationQuote {
    /// Event price times party size
    pub total_fee: Yen,
    /// Deposit times party size
    pub total_deposit: Yen,
    /// Fee plus deposit
    pub total_due: Yen,
}

/// Price a reservation for `guests` additional attendees.
#[must_use]
pub const fn quote(price: Yen, guests: GuestCount) -> ReservationQuote {
    let party = guests.party_size();
    let total_fee = price.times(party);
    let total_deposit = DEPOSIT_PER_PERSON.times(party);
    ReservationQuote {
        total_fee,
        total_deposit,
        total_due: Yen(total_fee.0 + total_deposit.0),
    }
}

/// A chat message, a child record of its event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Storage-assigned identifier
    pub id: MessageId,
    /// Message body, never empty
    pub text: String,
    /// Sender's user id
    pub sender_id: UserId,
    /// Sender's display name at send time
    pub sender_name: String,
    /// Sender's avatar URL at send time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_photo: Option<String>,
    /// Server-assigned send timestamp; the sole ordering authority
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// A not-yet-persisted chat message. The timestamp is server-assigned.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    /// Message body
    pub text: String,
    /// Sender's user id
    pub sender_id: UserId,
    /// Sender's display name
    pub sender_name: String,
    /// Sender's avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_photo: Option<String>,
}

/// A user's profile document, lazily created on first edit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Display name
    #[serde(default)]
    pub display_name: String,
    /// Free-form bio
    #[serde(default)]
    pub bio: String,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Preferred browsing area
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_area: Option<String>,
}

/// Partial profile update; only present fields are written (merge-upsert,
/// last-writer-wins).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    /// New display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// New bio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// New avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// New preferred area
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_area: Option<String>,
}

/// A participation record tying one user to one event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// The joined event
    pub event_id: EventId,
    /// The participating user
    pub user_id: UserId,
    /// Additional attendees the user brings
    pub guest_count: u8,
    /// Fee paid for the whole party
    pub total_fee: Yen,
    /// Deposit held for the whole party
    pub total_deposit: Yen,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn quote_matches_worked_scenario() {
        // price 500, one guest
        let q = quote(Yen(500), GuestCount::new(1).unwrap());
        assert_eq!(q.total_fee, Yen(1000));
        assert_eq!(q.total_deposit, Yen(100));
        assert_eq!(q.total_due, Yen(1100));
    }

    #[test]
    fn guest_count_rejects_more_than_three() {
        assert!(GuestCount::new(3).is_some());
        assert!(GuestCount::new(4).is_none());
    }

    #[test]
    fn default_deadline_is_24h_before_start() {
        let start = DateTime::parse_from_rfc3339("2026-03-01T18:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(default_deadline(start), start - Duration::hours(24));
    }

    #[test]
    fn effective_status_closes_at_deadline_and_capacity() {
        let start = DateTime::parse_from_rfc3339("2026-03-01T18:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut event = Event {
            id: EventId::new("e1"),
            title: "molkky".to_string(),
            category: Category::Sports,
            description: String::new(),
            start_at: start,
            end_at: start + Duration::hours(3),
            deadline_at: start - Duration::hours(12),
            location_name: "yoyogi".to_string(),
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
            created_at: start - Duration::days(7),
        };

        let before_deadline = start - Duration::hours(13);
        assert_eq!(
            event.effective_status(before_deadline),
            EventStatus::Recruiting
        );

        let after_deadline = start - Duration::hours(1);
        assert_eq!(event.effective_status(after_deadline), EventStatus::Closed);

        event.current_count = event.capacity;
        assert_eq!(event.effective_status(before_deadline), EventStatus::Closed);

        let after_end = start + Duration::hours(4);
        assert_eq!(event.effective_status(after_end), EventStatus::Completed);
    }

    #[test]
    fn event_serializes_to_stored_field_names() {
        let start = DateTime::parse_from_rfc3339("2026-03-01T18:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let event = Event {
            id: EventId::new("e1"),
            title: "sauna".to_string(),
            category: Category::Outdoor,
            description: String::new(),
            start_at: start,
            end_at: start + Duration::hours(3),
            deadline_at: start - Duration::hours(12),
            location_name: "motosu".to_string(),
            location_area: "山梨県".to_string(),
            capacity: 6,
            current_count: 2,
            price: Yen(2500),
            deposit: DEPOSIT_PER_PERSON,
            status: EventStatus::Recruiting,
            tags: vec!["サウナ".to_string()],
            image_url: None,
            level: Level::BeginnerWelcome,
            host_id: UserId::new("h1"),
            host_name: "host".to_string(),
            host_photo: None,
            created_at: start,
        };

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["startAt"], start.timestamp_millis());
        assert_eq!(value["locationArea"], "山梨県");
        assert_eq!(value["currentCount"], 2);
        assert_eq!(value["status"], "recruiting");
        assert_eq!(value["level"], "初心者歓迎");
        assert_eq!(value["hostId"], "h1");
    }

    proptest! {
        #[test]
        fn quote_algebra_holds(price in 0u64..100_000, guests in 0u8..=3) {
            let guests = GuestCount::new(guests).unwrap();
            let q = quote(Yen(price), guests);
            let party = guests.party_size();
            prop_assert_eq!(q.total_fee, Yen(price * party));
            prop_assert_eq!(q.total_deposit, Yen(50 * party));
            prop_assert_eq!(q.total_due, q.total_fee + q.total_deposit);
        }
    }
}
