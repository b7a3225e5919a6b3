//! Event authoring: the multi-field creation form.
//!
//! Validation runs locally before anything reaches the backend; a submit
//! that fails at the backend leaves the form open and populated for a
//! manual retry.

use crate::repo::Repo;
use crate::types::{
    Category, DEPOSIT_PER_PERSON, EventId, EventStatus, Level, NewEvent, UserId, Yen,
    default_deadline,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use monos_backend::{BlobStore, Identity};
use monos_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer};
use std::sync::Arc;

/// Inline validation message for an end time at or before the start time.
pub const TIME_ORDER_ERROR: &str = "終了時間は開始時間より後に設定してください。";
/// Generic submit failure message.
pub const SUBMIT_ERROR: &str = "送信に失敗しました。";
/// Failure message for the eager cover-image upload.
pub const UPLOAD_ERROR: &str = "画像のアップロードに失敗しました。";

/// Form state for a new event.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthoringState {
    /// Event title
    pub title: String,
    /// Selected category
    pub category: Category,
    /// Free-form description
    pub description: String,
    /// Event date
    pub date: Option<NaiveDate>,
    /// Start time on `date`
    pub start_time: Option<NaiveTime>,
    /// End time on `date`
    pub end_time: Option<NaiveTime>,
    /// Explicit reservation deadline; defaults to 24h before start
    pub deadline: Option<DateTime<Utc>>,
    /// Venue name
    pub location_name: String,
    /// Region
    pub location_area: String,
    /// Maximum participants
    pub capacity: u32,
    /// Fee per person
    pub price: Yen,
    /// Tags, unique, in insertion order
    pub tags: Vec<String>,
    /// Cover image URL once the eager upload resolves
    pub image_url: Option<String>,
    /// Expected experience level
    pub level: Level,
    /// A submit or upload is in flight
    pub submitting: bool,
    /// Inline validation or submit error
    pub last_error: Option<String>,
    /// Set once the event is persisted
    pub created: Option<EventId>,
}

impl Default for AuthoringState {
    fn default() -> Self {
        Self {
            title: String::new(),
            category: Category::Sports,
            description: String::new(),
            date: None,
            start_time: None,
            end_time: None,
            deadline: None,
            location_name: String::new(),
            location_area: "東京都".to_string(),
            capacity: 2,
            price: Yen(0),
            tags: Vec::new(),
            image_url: None,
            level: Level::BeginnerWelcome,
            submitting: false,
            last_error: None,
            created: None,
        }
    }
}

/// Authoring actions.
#[derive(Clone, Debug)]
pub enum AuthoringAction {
    /// Set the title
    SetTitle(String),
    /// Set the category
    SetCategory(Category),
    /// Set the description
    SetDescription(String),
    /// Set the event date
    SetDate(NaiveDate),
    /// Set the start time
    SetStartTime(NaiveTime),
    /// Set the end time
    SetEndTime(NaiveTime),
    /// Set an explicit reservation deadline
    SetDeadline(DateTime<Utc>),
    /// Set the venue name
    SetLocationName(String),
    /// Set the region
    SetLocationArea(String),
    /// Set the capacity
    SetCapacity(u32),
    /// Set the per-person fee
    SetPrice(Yen),
    /// Set the expected level
    SetLevel(Level),
    /// Add one tag; duplicates are silently ignored
    AddTag(String),
    /// Remove one tag
    RemoveTag(String),
    /// Attach a cover image, uploading it immediately
    AttachImage {
        /// Original file name, kept in the storage path
        file_name: String,
        /// Raw image bytes
        bytes: Vec<u8>,
    },
    /// The eager upload resolved to a fetchable URL
    ImageUploaded(String),
    /// The eager upload failed
    ImageUploadFailed(String),
    /// Validate and persist the event
    Submit,
    /// The event was persisted
    Submitted(EventId),
    /// The persist failed; the form stays populated
    SubmitFailed(String),
    /// Clear the form
    Reset,
}

/// Environment for the authoring reducer.
#[derive(Clone)]
pub struct AuthoringEnvironment {
    /// Typed storage access
    pub repo: Repo,
    /// Blob storage for cover images
    pub blobs: Arc<dyn BlobStore>,
    /// Clock for upload paths
    pub clock: Arc<dyn Clock>,
    /// The hosting user
    pub host: Identity,
}

impl AuthoringEnvironment {
    /// Creates a new `AuthoringEnvironment`
    #[must_use]
    pub fn new(
        repo: Repo,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        host: Identity,
    ) -> Self {
        Self {
            repo,
            blobs,
            clock,
            host,
        }
    }
}

/// Reducer for the authoring form
#[derive(Clone, Debug, Default)]
pub struct AuthoringReducer;

impl AuthoringReducer {
    /// Creates a new `AuthoringReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates the form and assembles the record to persist.
    fn validate(state: &AuthoringState, host: &Identity) -> Result<NewEvent, String> {
        if state.title.trim().is_empty() {
            return Err("タイトルを入力してください。".to_string());
        }
        if state.location_name.trim().is_empty() {
            return Err("開催場所を入力してください。".to_string());
        }
        let (Some(date), Some(start_time), Some(end_time)) =
            (state.date, state.start_time, state.end_time)
        else {
            return Err("日時を入力してください。".to_string());
        };

        let start_at = date.and_time(start_time).and_utc();
        let end_at = date.and_time(end_time).and_utc();
        if end_at <= start_at {
            return Err(TIME_ORDER_ERROR.to_string());
        }

        if state.capacity < 2 {
            return Err("定員は2名以上にしてください。".to_string());
        }

        Ok(NewEvent {
            title: state.title.clone(),
            category: state.category,
            description: state.description.clone(),
            start_at,
            end_at,
            deadline_at: state.deadline.unwrap_or_else(|| default_deadline(start_at)),
            location_name: state.location_name.clone(),
            location_area: state.location_area.clone(),
            capacity: state.capacity,
            current_count: 0,
            price: state.price,
            deposit: DEPOSIT_PER_PERSON,
            status: EventStatus::Recruiting,
            tags: state.tags.clone(),
            image_url: state.image_url.clone(),
            level: state.level,
            host_id: UserId::new(host.uid.clone()),
            host_name: host.display_name.clone().unwrap_or_default(),
            host_photo: host.photo_url.clone(),
        })
    }
}

impl Reducer for AuthoringReducer {
    type State = AuthoringState;
    type Action = AuthoringAction;
    type Environment = AuthoringEnvironment;

    #[allow(clippy::too_many_lines)]
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AuthoringAction::SetTitle(v) => state.title = v,
            AuthoringAction::SetCategory(v) => state.category = v,
            AuthoringAction::SetDescription(v) => state.description = v,
            AuthoringAction::SetDate(v) => state.date = Some(v),
            AuthoringAction::SetStartTime(v) => state.start_time = Some(v),
            AuthoringAction::SetEndTime(v) => state.end_time = Some(v),
            AuthoringAction::SetDeadline(v) => state.deadline = Some(v),
            AuthoringAction::SetLocationName(v) => state.location_name = v,
            AuthoringAction::SetLocationArea(v) => state.location_area = v,
            AuthoringAction::SetCapacity(v) => state.capacity = v,
            AuthoringAction::SetPrice(v) => state.price = v,
            AuthoringAction::SetLevel(v) => state.level = v,
            AuthoringAction::AddTag(tag) => {
                let tag = tag.trim().to_string();
                if !tag.is_empty() && !state.tags.contains(&tag) {
                    state.tags.push(tag);
                }
            }
            AuthoringAction::RemoveTag(tag) => {
                state.tags.retain(|t| t != &tag);
            }
            AuthoringAction::AttachImage { file_name, bytes } => {
                // Upload eagerly; abandoning the form afterwards orphans the
                // blob (no cleanup contract on the blob store).
                let blobs = Arc::clone(&env.blobs);
                let path = format!(
                    "images/{}_{}",
                    env.clock.now().timestamp_millis(),
                    file_name
                );
                return monos_core::smallvec![Effect::future(async move {
                    let blob = match blobs.upload(bytes, &path).await {
                        Ok(blob) => blob,
                        Err(e) => return Some(AuthoringAction::ImageUploadFailed(e.to_string())),
                    };
                    match blobs.resolve(&blob).await {
                        Ok(url) => Some(AuthoringAction::ImageUploaded(url)),
                        Err(e) => Some(AuthoringAction::ImageUploadFailed(e.to_string())),
                    }
                })];
            }
            AuthoringAction::ImageUploaded(url) => {
                state.image_url = Some(url);
            }
            AuthoringAction::ImageUploadFailed(error) => {
                tracing::warn!(%error, "cover image upload failed");
                state.last_error = Some(UPLOAD_ERROR.to_string());
            }
            AuthoringAction::Submit => {
                if state.submitting {
                    return SmallVec::new();
                }
                let event = match Self::validate(state, &env.host) {
                    Ok(event) => event,
                    Err(error) => {
                        state.last_error = Some(error);
                        return SmallVec::new();
                    }
                };

                state.submitting = true;
                state.last_error = None;

                let repo = env.repo.clone();
                return monos_core::smallvec![Effect::future(async move {
                    match repo.create_event(&event).await {
                        Ok(id) => Some(AuthoringAction::Submitted(id)),
                        Err(e) => {
                            tracing::warn!(error = %e, "event submit failed");
                            Some(AuthoringAction::SubmitFailed(SUBMIT_ERROR.to_string()))
                        }
                    }
                })];
            }
            AuthoringAction::Submitted(id) => {
                state.submitting = false;
                state.created = Some(id);
            }
            AuthoringAction::SubmitFailed(error) => {
                // The form stays populated; the user retries manually.
                state.submitting = false;
                state.last_error = Some(error);
            }
            AuthoringAction::Reset => {
                *state = AuthoringState::default();
            }
        }
        SmallVec::new()
    }
}
