//! User profile: lazily created on first edit, merge-upsert on save.

use crate::repo::Repo;
use crate::types::{ProfilePatch, UserId, UserProfile};
use monos_core::{SmallVec, effect::Effect, reducer::Reducer};

/// Profile state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileState {
    /// The loaded profile; default until the first load resolves
    pub profile: UserProfile,
    /// Whether a stored profile exists yet
    pub exists: bool,
    /// A save is in flight
    pub saving: bool,
    /// Last save failure
    pub last_error: Option<String>,
}

/// Profile actions.
#[derive(Clone, Debug)]
pub enum ProfileAction {
    /// Fetch the stored profile
    Load,
    /// The fetch resolved, `None` when never edited
    Loaded(Option<UserProfile>),
    /// Write a partial update, last-writer-wins
    Save(ProfilePatch),
    /// The write landed
    Saved(ProfilePatch),
    /// The write failed
    SaveFailed(String),
}

/// Environment for the profile reducer.
#[derive(Clone)]
pub struct ProfileEnvironment {
    /// Typed storage access
    pub repo: Repo,
    /// Whose profile this is
    pub user: UserId,
}

impl ProfileEnvironment {
    /// Creates a new `ProfileEnvironment`
    #[must_use]
    pub const fn new(repo: Repo, user: UserId) -> Self {
        Self { repo, user }
    }
}

/// Reducer for the profile feature
#[derive(Clone, Debug, Default)]
pub struct ProfileReducer;

impl ProfileReducer {
    /// Creates a new `ProfileReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn apply_patch(profile: &mut UserProfile, patch: ProfilePatch) {
        if let Some(name) = patch.display_name {
            profile.display_name = name;
        }
        if let Some(bio) = patch.bio {
            profile.bio = bio;
        }
        if let Some(photo) = patch.photo_url {
            profile.photo_url = Some(photo);
        }
        if let Some(area) = patch.selected_area {
            profile.selected_area = Some(area);
        }
    }
}

impl Reducer for ProfileReducer {
    type State = ProfileState;
    type Action = ProfileAction;
    type Environment = ProfileEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ProfileAction::Load => {
                let repo = env.repo.clone();
                let user = env.user.clone();
                monos_core::smallvec![Effect::future(async move {
                    match repo.fetch_profile(&user).await {
                        Ok(profile) => Some(ProfileAction::Loaded(profile)),
                        Err(e) => {
                            tracing::warn!(error = %e, "profile load failed");
                            Some(ProfileAction::Loaded(None))
                        }
                    }
                })]
            }
            ProfileAction::Loaded(profile) => {
                state.exists = profile.is_some();
                state.profile = profile.unwrap_or_default();
                SmallVec::new()
            }
            ProfileAction::Save(patch) => {
                if state.saving {
                    return SmallVec::new();
                }
                state.saving = true;
                state.last_error = None;

                let repo = env.repo.clone();
                let user = env.user.clone();
                monos_core::smallvec![Effect::future(async move {
                    match repo.upsert_profile(&user, &patch).await {
                        Ok(()) => Some(ProfileAction::Saved(patch)),
                        Err(e) => Some(ProfileAction::SaveFailed(e.to_string())),
                    }
                })]
            }
            ProfileAction::Saved(patch) => {
                // Local state mirrors the write only after the backend
                // confirms it.
                state.saving = false;
                state.exists = true;
                Self::apply_patch(&mut state.profile, patch);
                SmallVec::new()
            }
            ProfileAction::SaveFailed(error) => {
                state.saving = false;
                state.last_error = Some(error);
                SmallVec::new()
            }
        }
    }
}
