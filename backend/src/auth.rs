//! Identity provider boundary.
//!
//! Session state is a watchable value, not a sequence of callbacks: the
//! provider starts in [`AuthState::Pending`] until the first session check
//! resolves, so consumers can render a loading state instead of flashing a
//! signed-out screen at a signed-in user.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

/// Errors surfaced by identity operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The user dismissed the provider's sign-in flow
    #[error("sign-in cancelled by user")]
    Cancelled,

    /// The provider rejected or failed the operation
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// An authenticated user as reported by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    /// Stable provider-assigned user id
    pub uid: String,
    /// Display name from the provider, if any
    pub display_name: Option<String>,
    /// Avatar URL from the provider, if any
    pub photo_url: Option<String>,
}

impl Identity {
    /// Build an identity with just a uid.
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            photo_url: None,
        }
    }
}

/// Current session state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthState {
    /// The initial session check has not resolved yet
    Pending,
    /// A user is signed in
    SignedIn(Identity),
    /// Nobody is signed in
    SignedOut,
}

impl AuthState {
    /// The signed-in identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn(identity) => Some(identity),
            Self::Pending | Self::SignedOut => None,
        }
    }
}

/// The identity provider boundary.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Run the provider's interactive sign-in flow.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Cancelled`] when the user dismisses the flow,
    /// or [`AuthError::Provider`] on provider failure.
    async fn sign_in(&self) -> Result<Identity, AuthError>;

    /// End the current session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Provider`] on provider failure.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Watch the session state. The receiver always holds the latest state.
    fn session(&self) -> watch::Receiver<AuthState>;
}

/// Local identity provider for tests and the demo.
///
/// Holds one fixed identity and signs it in without any interactive flow.
pub struct LocalAuth {
    identity: Identity,
    state: watch::Sender<AuthState>,
}

impl LocalAuth {
    /// Create a provider for `identity`, starting signed out.
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        let (state, _) = watch::channel(AuthState::SignedOut);
        Self { identity, state }
    }

    /// Create a provider for `identity` with a session already established.
    #[must_use]
    pub fn signed_in(identity: Identity) -> Self {
        let (state, _) = watch::channel(AuthState::SignedIn(identity.clone()));
        Self { identity, state }
    }
}

#[async_trait]
impl AuthProvider for LocalAuth {
    async fn sign_in(&self) -> Result<Identity, AuthError> {
        self.state
            .send_replace(AuthState::SignedIn(self.identity.clone()));
        Ok(self.identity.clone())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.state.send_replace(AuthState::SignedOut);
        Ok(())
    }

    fn session(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }
}
