//! Per-event chat: append-only message stream with live read.
//!
//! Ordering authority is the server-assigned timestamp; the local list is
//! replaced wholesale by each subscription emission, never patched.

use crate::live::{LiveQuery, decode_snapshot};
use crate::queries::event_messages;
use crate::repo::Repo;
use crate::types::{ChatMessage, EventId, NewMessage, UserId};
use monos_backend::{AuthProvider, DocumentStore};
use monos_core::{SmallVec, effect::Effect, reducer::Reducer};
use monos_runtime::Store;
use std::sync::Arc;

/// Failure message shown when a send does not land.
pub const SEND_ERROR: &str = "メッセージの送信に失敗しました。";

/// Chat state for one event's room.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatState {
    /// Messages, ascending by server timestamp
    pub messages: Vec<ChatMessage>,
    /// The room's event title, for the header
    pub title: String,
    /// A send is in flight
    pub sending: bool,
    /// Last send failure or rejection
    pub last_error: Option<String>,
}

/// Chat actions.
#[derive(Clone, Debug)]
pub enum ChatAction {
    /// Send a message as the signed-in user
    SendMessage(String),
    /// The backend accepted the message
    MessageSent,
    /// The send failed
    SendFailed(String),
    /// A new authoritative snapshot of the room's messages arrived
    MessagesUpdated(Vec<ChatMessage>),
}

/// Environment for the chat reducer.
#[derive(Clone)]
pub struct ChatEnvironment {
    /// Typed storage access
    pub repo: Repo,
    /// Identity provider, consulted per send
    pub auth: Arc<dyn AuthProvider>,
    /// The room's event
    pub event_id: EventId,
}

impl ChatEnvironment {
    /// Creates a new `ChatEnvironment`
    #[must_use]
    pub const fn new(repo: Repo, auth: Arc<dyn AuthProvider>, event_id: EventId) -> Self {
        Self {
            repo,
            auth,
            event_id,
        }
    }
}

/// Reducer for one chat room
#[derive(Clone, Debug, Default)]
pub struct ChatReducer;

impl ChatReducer {
    /// Creates a new `ChatReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for ChatReducer {
    type State = ChatState;
    type Action = ChatAction;
    type Environment = ChatEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ChatAction::SendMessage(text) => {
                if state.sending {
                    return SmallVec::new();
                }
                let text = text.trim().to_string();
                if text.is_empty() {
                    // Rejected locally; the stream is untouched.
                    return SmallVec::new();
                }
                let Some(sender) = env.auth.session().borrow().identity().cloned() else {
                    state.last_error = Some(SEND_ERROR.to_string());
                    return SmallVec::new();
                };

                state.sending = true;
                state.last_error = None;

                let message = NewMessage {
                    text,
                    sender_id: UserId::new(sender.uid),
                    sender_name: sender.display_name.unwrap_or_default(),
                    sender_photo: sender.photo_url,
                };
                let repo = env.repo.clone();
                let event_id = env.event_id.clone();

                monos_core::smallvec![Effect::future(async move {
                    match repo.append_message(&event_id, &message).await {
                        Ok(()) => Some(ChatAction::MessageSent),
                        Err(e) => {
                            tracing::warn!(error = %e, "message send failed");
                            Some(ChatAction::SendFailed(SEND_ERROR.to_string()))
                        }
                    }
                })]
            }
            ChatAction::MessageSent => {
                state.sending = false;
                SmallVec::new()
            }
            ChatAction::SendFailed(error) => {
                state.sending = false;
                state.last_error = Some(error);
                SmallVec::new()
            }
            ChatAction::MessagesUpdated(messages) => {
                state.messages = messages;
                SmallVec::new()
            }
        }
    }
}

/// One open chat room: its store plus the live message subscription.
///
/// Dropping the room tears the subscription down with it.
pub struct ChatRoom {
    store: Store<ChatState, ChatAction, ChatEnvironment, ChatReducer>,
    _live: LiveQuery,
}

impl ChatRoom {
    /// Open the room for `event_id`, subscribing to its messages.
    #[must_use]
    pub fn open(
        backend: &Arc<dyn DocumentStore>,
        repo: Repo,
        auth: Arc<dyn AuthProvider>,
        event_id: EventId,
        title: String,
    ) -> Self {
        let store = Store::new(
            ChatState {
                title,
                ..ChatState::default()
            },
            ChatReducer::new(),
            ChatEnvironment::new(repo, auth, event_id.clone()),
        );
        let live = LiveQuery::open(
            backend.as_ref(),
            event_messages(&event_id),
            store.clone(),
            |snapshot| ChatAction::MessagesUpdated(decode_snapshot(snapshot)),
        );
        Self { store, _live: live }
    }

    /// The room's store, for reading state and observing actions.
    #[must_use]
    pub const fn store(&self) -> &Store<ChatState, ChatAction, ChatEnvironment, ChatReducer> {
        &self.store
    }

    /// Send a message.
    ///
    /// # Errors
    ///
    /// Returns [`monos_runtime::StoreError`] when the store is shutting down.
    pub async fn send_message(&self, text: impl Into<String>) -> Result<(), monos_runtime::StoreError> {
        self.store.send(ChatAction::SendMessage(text.into())).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use monos_backend::{Identity, LocalAuth, MemoryStore};
    use monos_testing::{ReducerTest, assertions};
    use crate::types::MessageId;

    fn env(auth: LocalAuth) -> ChatEnvironment {
        ChatEnvironment::new(
            Repo::new(Arc::new(MemoryStore::new())),
            Arc::new(auth),
            EventId::new("e1"),
        )
    }

    #[test]
    fn whitespace_only_text_is_rejected_without_effects() {
        ReducerTest::new(ChatReducer::new())
            .with_env(env(LocalAuth::signed_in(Identity::new("u1"))))
            .given_state(ChatState::default())
            .when_action(ChatAction::SendMessage("   \n".to_string()))
            .then_state(|state| assert!(!state.sending))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn unauthenticated_send_is_rejected() {
        ReducerTest::new(ChatReducer::new())
            .with_env(env(LocalAuth::new(Identity::new("u1"))))
            .given_state(ChatState::default())
            .when_action(ChatAction::SendMessage("こんにちは".to_string()))
            .then_state(|state| {
                assert_eq!(state.last_error.as_deref(), Some(SEND_ERROR));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn signed_in_send_produces_append_effect() {
        ReducerTest::new(ChatReducer::new())
            .with_env(env(LocalAuth::signed_in(Identity::new("u1"))))
            .given_state(ChatState::default())
            .when_action(ChatAction::SendMessage("こんにちは".to_string()))
            .then_state(|state| assert!(state.sending))
            .then_effects(|effects| {
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn send_while_one_is_in_flight_is_ignored() {
        ReducerTest::new(ChatReducer::new())
            .with_env(env(LocalAuth::signed_in(Identity::new("u1"))))
            .given_state(ChatState {
                sending: true,
                ..ChatState::default()
            })
            .when_action(ChatAction::SendMessage("もう一度".to_string()))
            .then_state(|state| assert!(state.sending))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn snapshot_replaces_message_list() {
        let message = ChatMessage {
            id: MessageId("m1".to_string()),
            text: "よろしく".to_string(),
            sender_id: UserId::new("u2"),
            sender_name: "花子".to_string(),
            sender_photo: None,
            created_at: Utc::now(),
        };
        let expected = message.clone();

        ReducerTest::new(ChatReducer::new())
            .with_env(env(LocalAuth::signed_in(Identity::new("u1"))))
            .given_state(ChatState::default())
            .when_action(ChatAction::MessagesUpdated(vec![message]))
            .then_state(move |state| {
                assert_eq!(state.messages, vec![expected.clone()]);
            })
            .run();
    }
}
