//! Session feature: sign-in and sign-out against the identity provider.
//!
//! The state starts `Pending` until the provider's initial session check
//! resolves, so the UI can show a loading state instead of assuming
//! signed-out.

use monos_backend::{AuthProvider, AuthState, Identity};
use monos_core::{SmallVec, effect::Effect, reducer::Reducer};
use std::sync::Arc;

/// Session state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    /// Current session, mirroring the provider
    pub auth: AuthState,
    /// Last sign-in failure, cleared on the next attempt
    pub last_error: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            auth: AuthState::Pending,
            last_error: None,
        }
    }
}

impl SessionState {
    /// The signed-in identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.auth.identity()
    }
}

/// Session actions.
#[derive(Clone, Debug)]
pub enum SessionAction {
    /// Start the provider's sign-in flow
    SignIn,
    /// End the current session
    SignOut,
    /// The provider's initial session check resolved
    SessionResolved(AuthState),
    /// Sign-in completed
    SignedIn(Identity),
    /// Sign-in failed or was cancelled
    SignInFailed {
        /// Provider failure message
        error: String,
    },
    /// Sign-out completed
    SignedOut,
}

/// Environment for the session reducer.
#[derive(Clone)]
pub struct SessionEnvironment {
    /// Identity provider
    pub auth: Arc<dyn AuthProvider>,
}

impl SessionEnvironment {
    /// Creates a new `SessionEnvironment`
    #[must_use]
    pub fn new(auth: Arc<dyn AuthProvider>) -> Self {
        Self { auth }
    }
}

/// Reducer for the session feature
#[derive(Clone, Debug, Default)]
pub struct SessionReducer;

impl SessionReducer {
    /// Creates a new `SessionReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for SessionReducer {
    type State = SessionState;
    type Action = SessionAction;
    type Environment = SessionEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            SessionAction::SignIn => {
                state.last_error = None;
                let auth = Arc::clone(&env.auth);
                monos_core::smallvec![Effect::future(async move {
                    match auth.sign_in().await {
                        Ok(identity) => Some(SessionAction::SignedIn(identity)),
                        Err(e) => Some(SessionAction::SignInFailed {
                            error: e.to_string(),
                        }),
                    }
                })]
            }
            SessionAction::SignOut => {
                let auth = Arc::clone(&env.auth);
                monos_core::smallvec![Effect::future(async move {
                    // Local sign-out cannot meaningfully fail; log and move on.
                    if let Err(e) = auth.sign_out().await {
                        tracing::warn!(error = %e, "sign-out reported an error");
                    }
                    Some(SessionAction::SignedOut)
                })]
            }
            SessionAction::SessionResolved(auth) => {
                state.auth = auth;
                SmallVec::new()
            }
            SessionAction::SignedIn(identity) => {
                state.auth = AuthState::SignedIn(identity);
                state.last_error = None;
                SmallVec::new()
            }
            SessionAction::SignInFailed { error } => {
                state.auth = AuthState::SignedOut;
                state.last_error = Some(error);
                SmallVec::new()
            }
            SessionAction::SignedOut => {
                state.auth = AuthState::SignedOut;
                SmallVec::new()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use monos_backend::LocalAuth;
    use monos_testing::ReducerTest;

    fn env() -> SessionEnvironment {
        SessionEnvironment::new(Arc::new(LocalAuth::new(Identity::new("user-1"))))
    }

    #[test]
    fn starts_pending() {
        assert_eq!(SessionState::default().auth, AuthState::Pending);
    }

    #[test]
    fn sign_in_produces_an_effect_without_advancing_state() {
        ReducerTest::new(SessionReducer::new())
            .with_env(env())
            .given_state(SessionState::default())
            .when_action(SessionAction::SignIn)
            .then_state(|state| {
                // Still pending until the provider confirms.
                assert_eq!(state.auth, AuthState::Pending);
            })
            .then_effects(|effects| {
                monos_testing::assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn signed_in_confirmation_updates_session() {
        ReducerTest::new(SessionReducer::new())
            .with_env(env())
            .given_state(SessionState::default())
            .when_action(SessionAction::SignedIn(Identity::new("user-1")))
            .then_state(|state| {
                assert_eq!(state.identity().map(|i| i.uid.as_str()), Some("user-1"));
            })
            .run();
    }

    #[test]
    fn failed_sign_in_records_error_and_signs_out() {
        ReducerTest::new(SessionReducer::new())
            .with_env(env())
            .given_state(SessionState::default())
            .when_action(SessionAction::SignInFailed {
                error: "cancelled".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.auth, AuthState::SignedOut);
                assert_eq!(state.last_error.as_deref(), Some("cancelled"));
            })
            .run();
    }
}
