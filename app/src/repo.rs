//! Typed repository over the document store.
//!
//! Translates between domain structs and the JSON documents the store holds,
//! and owns the one piece of contention in the system: the atomic,
//! capacity-guarded participant increment.

use crate::live::decode_document;
use crate::types::{
    Event, EventId, NewEvent, NewMessage, Participant, ProfilePatch, UserId, UserProfile,
};
use monos_backend::{BackendError, DocId, DocumentStore};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

/// Collection holding event documents.
pub const EVENTS: &str = "events";
/// Collection holding participation records.
pub const PARTICIPANTS: &str = "participants";
/// Collection holding user profiles, keyed by user id.
pub const PROFILES: &str = "profiles";

/// Collection path for one event's messages.
#[must_use]
pub fn messages_collection(event_id: &EventId) -> String {
    format!("events/{event_id}/messages")
}

/// Errors from repository operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// The referenced event does not exist
    #[error("event {0} not found")]
    EventNotFound(EventId),

    /// Only the host may perform this operation
    #[error("user {0} is not the host of event {1}")]
    NotHost(UserId, EventId),

    /// A stored document did not decode into its domain type
    #[error("malformed document: {0}")]
    Malformed(String),

    /// The storage backend failed
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors from the join operation, kept separate so a full event is
/// distinguishable from a generic failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JoinError {
    /// The event has no seats left
    #[error("event is full")]
    EventFull,

    /// Anything else that went wrong while joining
    #[error(transparent)]
    Other(#[from] RepoError),
}

/// Reason string the capacity guard rejects with, used to recognize a
/// full event among precondition failures.
const FULL_REASON: &str = "event is full";

/// Typed access to the MONOs collections.
#[derive(Clone)]
pub struct Repo {
    store: Arc<dyn DocumentStore>,
}

impl Repo {
    /// Create a repository over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The underlying document store, for opening live queries.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Persist a new event, returning its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::Backend`] when the write fails.
    pub async fn create_event(&self, event: &NewEvent) -> Result<EventId, RepoError> {
        let data = serde_json::to_value(event)
            .map_err(|e| RepoError::Malformed(e.to_string()))?;
        let id = self.store.insert(EVENTS, data).await?;
        tracing::info!(event_id = %id, title = %event.title, "event created");
        Ok(EventId::new(id.into_inner()))
    }

    /// Fetch one event by id.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::EventNotFound`] when no such event exists.
    pub async fn fetch_event(&self, id: &EventId) -> Result<Event, RepoError> {
        let doc_id = DocId::new(id.as_str());
        let data = self
            .store
            .get(EVENTS, &doc_id)
            .await?
            .ok_or_else(|| RepoError::EventNotFound(id.clone()))?;
        decode_document(&doc_id, data).map_err(RepoError::Malformed)
    }

    /// Delete an event. Only its host may do so.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::NotHost`] when `user` is not the event's host.
    pub async fn delete_event(&self, id: &EventId, user: &UserId) -> Result<(), RepoError> {
        let event = self.fetch_event(id).await?;
        if event.host_id != *user {
            return Err(RepoError::NotHost(user.clone(), id.clone()));
        }
        self.store.delete(EVENTS, &DocId::new(id.as_str())).await?;
        tracing::info!(event_id = %id, "event deleted by host");
        Ok(())
    }

    /// Join an event: atomically increment its participant count, guarded by
    /// capacity, then persist the participation record.
    ///
    /// The increment is one per reservation regardless of party size; guests
    /// accompany the reserving participant's seat. State above the repository
    /// must only advance on this call's success. When the record write fails
    /// after the increment committed, the seat is released again before the
    /// error surfaces, so a retry never consumes a second one.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError::EventFull`] when the capacity guard rejects.
    pub async fn join_event(
        &self,
        id: &EventId,
        participant: &Participant,
    ) -> Result<(), JoinError> {
        let doc_id = DocId::new(id.as_str());
        let result = self
            .store
            .update_if(
                EVENTS,
                &doc_id,
                Box::new(|doc| {
                    let current = doc
                        .get("currentCount")
                        .and_then(serde_json::Value::as_u64)
                        .ok_or_else(|| "missing currentCount".to_string())?;
                    let capacity = doc
                        .get("capacity")
                        .and_then(serde_json::Value::as_u64)
                        .ok_or_else(|| "missing capacity".to_string())?;
                    if current + 1 > capacity {
                        return Err(FULL_REASON.to_string());
                    }
                    doc["currentCount"] = json!(current + 1);
                    Ok(())
                }),
            )
            .await;

        match result {
            Ok(_) => {}
            Err(BackendError::PreconditionFailed { reason }) if reason == FULL_REASON => {
                tracing::info!(event_id = %id, "join rejected, event full");
                return Err(JoinError::EventFull);
            }
            Err(BackendError::NotFound { .. }) => {
                return Err(JoinError::Other(RepoError::EventNotFound(id.clone())));
            }
            Err(e) => return Err(JoinError::Other(RepoError::Backend(e))),
        }

        if let Err(e) = self.persist_participant(participant).await {
            // The seat is taken but no reservation exists; give it back so a
            // manual retry does not consume a second one.
            self.release_seat(id, &doc_id).await;
            return Err(JoinError::Other(e));
        }
        tracing::info!(event_id = %id, user_id = %participant.user_id, "reservation committed");
        Ok(())
    }

    async fn persist_participant(&self, participant: &Participant) -> Result<(), RepoError> {
        let record = serde_json::to_value(participant)
            .map_err(|e| RepoError::Malformed(e.to_string()))?;
        self.store.insert(PARTICIPANTS, record).await?;
        Ok(())
    }

    /// Undo a committed increment whose participant record never landed.
    async fn release_seat(&self, id: &EventId, doc_id: &DocId) {
        let result = self
            .store
            .update_if(
                EVENTS,
                doc_id,
                Box::new(|doc| {
                    let current = doc
                        .get("currentCount")
                        .and_then(serde_json::Value::as_u64)
                        .ok_or_else(|| "missing currentCount".to_string())?;
                    doc["currentCount"] = json!(current.saturating_sub(1));
                    Ok(())
                }),
            )
            .await;
        if let Err(e) = result {
            tracing::warn!(event_id = %id, error = %e, "seat not released after aborted join");
        }
    }

    /// Append a message to an event's chat. The store assigns the timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::Backend`] when the write fails.
    pub async fn append_message(
        &self,
        event_id: &EventId,
        message: &NewMessage,
    ) -> Result<(), RepoError> {
        let data = serde_json::to_value(message)
            .map_err(|e| RepoError::Malformed(e.to_string()))?;
        self.store
            .insert(&messages_collection(event_id), data)
            .await?;
        Ok(())
    }

    /// Merge profile fields for `user`, creating the profile when absent.
    /// Last-writer-wins per field.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::Backend`] when the write fails.
    pub async fn upsert_profile(
        &self,
        user: &UserId,
        patch: &ProfilePatch,
    ) -> Result<(), RepoError> {
        let fields = serde_json::to_value(patch)
            .map_err(|e| RepoError::Malformed(e.to_string()))?;
        self.store
            .merge(PROFILES, &DocId::new(user.as_str()), fields)
            .await?;
        Ok(())
    }

    /// Fetch a user's profile, `None` when never edited.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::Malformed`] when the stored document does not
    /// decode.
    pub async fn fetch_profile(&self, user: &UserId) -> Result<Option<UserProfile>, RepoError> {
        let data = self
            .store
            .get(PROFILES, &DocId::new(user.as_str()))
            .await?;
        data.map(|d| serde_json::from_value(d).map_err(|e| RepoError::Malformed(e.to_string())))
            .transpose()
    }
}
