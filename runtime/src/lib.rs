//! # MONOs Runtime
//!
//! Runtime implementation for the MONOs reducer architecture.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and effect handling.
//!
//! ## Core Components
//!
//! - **Store**: The runtime that manages state and executes effects
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to reducers
//! - **Action Broadcast**: Lets observers wait for result actions produced by effects
//!
//! ## Example
//!
//! ```ignore
//! use monos_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use monos_core::{effect::Effect, reducer::Reducer};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};

pub use error::StoreError;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for a matching result action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        ///
        /// The action broadcast channel was closed, typically because the
        /// store is shutting down.
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

/// The Store - runtime coordinator for a reducer
///
/// The Store manages:
/// 1. State (behind `RwLock` for concurrent access)
/// 2. Reducer (business logic)
/// 3. Environment (injected dependencies)
/// 4. Effect execution (with feedback loop)
///
/// Cloning a `Store` is cheap; clones share the same state and effect
/// executor, which is how live subscriptions feed snapshot actions into a
/// store owned by a view.
///
/// # Type Parameters
///
/// - `S`: State type
/// - `A`: Action type
/// - `E`: Environment type
/// - `R`: Reducer implementation
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    inner: Arc<StoreInner<S, A, E, R>>,
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct StoreInner<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    state: RwLock<S>,
    reducer: R,
    environment: E,
    shutdown: AtomicBool,
    pending_effects: AtomicUsize,
    /// Action broadcast channel for observing actions produced by effects.
    ///
    /// All actions produced by effects (e.g., from `Effect::Future`) are
    /// broadcast to observers. This enables request-response patterns such as
    /// waiting for a reservation commit to be confirmed by the backend.
    action_broadcast: broadcast::Sender<A>,
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + Clone + 'static,
    S: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Create a new store with initial state, reducer, and environment
    ///
    /// Default action broadcast capacity is 16; increase with
    /// [`Store::with_broadcast_capacity`] when many observers are attached.
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
    }

    /// Create a new Store with custom action broadcast capacity
    ///
    /// # Arguments
    ///
    /// - `initial_state`: The starting state for the store
    /// - `reducer`: The reducer implementation (business logic)
    /// - `environment`: Injected dependencies
    /// - `capacity`: Action broadcast channel capacity (number of actions buffered)
    #[must_use]
    pub fn with_broadcast_capacity(
        initial_state: S,
        reducer: R,
        environment: E,
        capacity: usize,
    ) -> Self {
        let (action_broadcast, _) = broadcast::channel(capacity);

        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(initial_state),
                reducer,
                environment,
                shutdown: AtomicBool::new(false),
                pending_effects: AtomicUsize::new(0),
                action_broadcast,
            }),
        }
    }

    /// Send an action to the store
    ///
    /// This is the primary way to interact with the store:
    /// 1. Acquires write lock on state
    /// 2. Calls reducer with (state, action, environment)
    /// 3. Executes returned effects asynchronously
    /// 4. Effects may produce more actions (feedback loop)
    ///
    /// # Concurrency and Effect Execution
    ///
    /// - The reducer executes synchronously while holding a write lock
    /// - Effects execute asynchronously in spawned tasks
    /// - `send()` returns after starting effect execution, not completion
    /// - Multiple concurrent `send()` calls serialize at the reducer level
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
    #[tracing::instrument(skip(self, action), name = "store_send")]
    pub async fn send(&self, action: A) -> Result<(), StoreError> {
        if self.inner.shutdown.load(Ordering::Acquire) {
            return Err(StoreError::ShutdownInProgress);
        }

        metrics::counter!("store.actions").increment(1);
        Arc::clone(&self.inner).dispatch(action).await;
        Ok(())
    }

    /// Send an action and wait for a matching result action
    ///
    /// Designed for request-response interactions: subscribe to the action
    /// broadcast BEFORE sending (avoids race conditions), send the initial
    /// action, then wait for the first effect-produced action matching the
    /// predicate.
    ///
    /// Only actions produced by effects are broadcast, not the initial action.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`]: Timeout expired before matching action received
    /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
    /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
    pub async fn send_and_wait_for<F>(
        &self,
        action: A,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool,
    {
        let mut rx = self.inner.action_broadcast.subscribe();
        self.send(action).await?;

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Err(_) => return Err(StoreError::Timeout),
                Ok(Ok(candidate)) => {
                    if predicate(&candidate) {
                        return Ok(candidate);
                    }
                },
                Ok(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                    tracing::warn!(skipped, "action observer lagged; skipping");
                },
                Ok(Err(broadcast::error::RecvError::Closed)) => {
                    return Err(StoreError::ChannelClosed);
                },
            }
        }
    }

    /// Read a value derived from the current state
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.inner.state.read().await;
        f(&state)
    }

    /// Subscribe to actions produced by effects
    ///
    /// Returns a broadcast receiver that receives all actions fed back into
    /// the reducer by effect execution.
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
        self.inner.action_broadcast.subscribe()
    }

    /// Number of effects currently in flight
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.inner.pending_effects.load(Ordering::Acquire)
    }

    /// Initiate graceful shutdown of the store
    ///
    /// Sets the shutdown flag (rejecting new actions), then waits for pending
    /// effects to complete.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before
    /// all pending effects complete.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        tracing::info!("Initiating graceful shutdown");
        self.inner.shutdown.store(true, Ordering::Release);

        let start = tokio::time::Instant::now();
        let poll_interval = Duration::from_millis(10);

        loop {
            let pending = self.inner.pending_effects.load(Ordering::Acquire);

            if pending == 0 {
                tracing::info!("All effects completed, shutdown successful");
                return Ok(());
            }

            if start.elapsed() >= timeout {
                tracing::error!(pending_effects = pending, "Shutdown timed out");
                return Err(StoreError::ShutdownTimeout(pending));
            }

            tokio::time::sleep(poll_interval).await;
        }
    }
}

impl<S, A, E, R> StoreInner<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + Clone + 'static,
    S: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Run the reducer for one action and start execution of its effects.
    async fn dispatch(self: Arc<Self>, action: A) {
        let effects = {
            let mut state = self.state.write().await;
            self.reducer.reduce(&mut state, action, &self.environment)
        };

        for effect in effects {
            Arc::clone(&self).spawn_effect(effect);
        }
    }

    fn spawn_effect(self: Arc<Self>, effect: Effect<A>) {
        self.pending_effects.fetch_add(1, Ordering::AcqRel);
        metrics::counter!("store.effects").increment(1);

        tokio::spawn(async move {
            Arc::clone(&self).run_effect(effect).await;
            self.pending_effects.fetch_sub(1, Ordering::AcqRel);
        });
    }

    /// Execute one effect description.
    ///
    /// Boxed because effect trees recurse (Parallel/Sequential).
    fn run_effect(self: Arc<Self>, effect: Effect<A>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            match effect {
                Effect::None => {},
                Effect::Parallel(effects) => {
                    let branches = effects
                        .into_iter()
                        .map(|e| Arc::clone(&self).run_effect(e));
                    futures::future::join_all(branches).await;
                },
                Effect::Sequential(effects) => {
                    for e in effects {
                        Arc::clone(&self).run_effect(e).await;
                    }
                },
                Effect::Delay { duration, action } => {
                    tokio::time::sleep(duration).await;
                    self.feed(*action).await;
                },
                Effect::Future(fut) => {
                    if let Some(action) = fut.await {
                        self.feed(action).await;
                    }
                },
            }
        })
    }

    /// Feed an effect-produced action back into the reducer and broadcast it.
    async fn feed(self: Arc<Self>, action: A) {
        let _ = self.action_broadcast.send(action.clone());
        self.dispatch(action).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use monos_core::smallvec;
    use smallvec::SmallVec;

    #[derive(Clone, Debug, Default)]
    struct CounterState {
        count: i64,
        confirmed: bool,
    }

    #[derive(Clone, Debug)]
    enum CounterAction {
        Increment,
        IncrementLater,
        Confirmed,
    }

    struct CounterEnv;

    #[derive(Clone)]
    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = CounterState;
        type Action = CounterAction;
        type Environment = CounterEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                CounterAction::Increment => {
                    state.count += 1;
                    smallvec![]
                },
                CounterAction::IncrementLater => {
                    smallvec![Effect::future(async { Some(CounterAction::Confirmed) })]
                },
                CounterAction::Confirmed => {
                    state.count += 1;
                    state.confirmed = true;
                    smallvec![]
                },
            }
        }
    }

    #[tokio::test]
    async fn send_runs_the_reducer() {
        let store = Store::new(CounterState::default(), CounterReducer, CounterEnv);
        store.send(CounterAction::Increment).await.unwrap();
        assert_eq!(store.state(|s| s.count).await, 1);
    }

    #[tokio::test]
    async fn effect_feedback_reaches_the_reducer() {
        let store = Store::new(CounterState::default(), CounterReducer, CounterEnv);
        let result = store
            .send_and_wait_for(
                CounterAction::IncrementLater,
                |a| matches!(a, CounterAction::Confirmed),
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert!(matches!(result, CounterAction::Confirmed));
        assert!(store.state(|s| s.confirmed).await);
    }

    #[tokio::test]
    async fn shutdown_rejects_new_actions() {
        let store = Store::new(CounterState::default(), CounterReducer, CounterEnv);
        store.shutdown(Duration::from_secs(1)).await.unwrap();
        let result = store.send(CounterAction::Increment).await;
        assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
    }

    #[tokio::test]
    async fn wait_for_times_out_without_matching_action() {
        let store = Store::new(CounterState::default(), CounterReducer, CounterEnv);
        let result = store
            .send_and_wait_for(
                CounterAction::Increment,
                |a| matches!(a, CounterAction::Confirmed),
                Duration::from_millis(50),
            )
            .await;
        assert!(matches!(result, Err(StoreError::Timeout)));
    }
}
