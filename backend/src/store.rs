//! Document store contract.
//!
//! Collection-based CRUD over JSON documents with live snapshot subscriptions
//! and atomic conditional updates. The application mutates the one contended
//! field in the system (an event's participant count) exclusively through
//! [`DocumentStore::update_if`], never via read-then-write from the client.

use async_trait::async_trait;
use futures::Stream;
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use thiserror::Error;

/// Errors surfaced by document store operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The referenced document does not exist
    #[error("document {id} not found in {collection}")]
    NotFound {
        /// Collection that was queried
        collection: String,
        /// Document id that was requested
        id: String,
    },

    /// An atomic conditional update rejected the mutation
    ///
    /// Distinct from [`BackendError::Unavailable`] so callers can translate
    /// a violated guard (such as a full event) into a specific user-facing
    /// error rather than a generic failure.
    #[error("precondition failed: {reason}")]
    PreconditionFailed {
        /// Why the guard rejected the mutation
        reason: String,
    },

    /// The backend could not be reached or refused the operation
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The payload was not a JSON object or failed to decode
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Opaque document identifier, assigned by the store on creation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocId(String);

impl DocId {
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

    /// Convert into the inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DocId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DocId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One stored document: its id plus its JSON payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Store-assigned identifier
    pub id: DocId,
    /// The document payload
    pub data: Value,
}

/// A full query result set delivered by a live subscription.
///
/// Each emission replaces the previous one; consumers must treat it as
/// authoritative, not as an incremental patch.
pub type Snapshot = Vec<Document>;

/// Sort direction for a query's ordering field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Smallest value first
    Ascending,
    /// Largest value first
    Descending,
}

/// Declarative description of a collection query.
///
/// Equality filters, one ordering field with direction, and an optional
/// result limit — the full extent of the query support the application needs.
///
/// # Examples
///
/// ```
/// use monos_backend::store::{Direction, QuerySpec};
///
/// let spec = QuerySpec::new("events", "createdAt", Direction::Descending)
///     .where_eq("hostId", "user-1")
///     .limit(20);
/// assert_eq!(spec.collection, "events");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct QuerySpec {
    /// Collection to query
    pub collection: String,
    /// Equality filters (`field == value`), all of which must match
    pub filters: Vec<(String, Value)>,
    /// Field to order by
    pub order_by: String,
    /// Sort direction
    pub direction: Direction,
    /// Maximum number of documents to return
    pub limit: Option<usize>,
}

impl QuerySpec {
    /// Create a query over `collection`, ordered by `order_by`.
    #[must_use]
    pub fn new(
        collection: impl Into<String>,
        order_by: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order_by: order_by.into(),
            direction,
            limit: None,
        }
    }

    /// Add an equality filter.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    /// Cap the result set size.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A guarded mutation applied atomically to one document.
///
/// Returning `Err(reason)` rejects the update and leaves the document
/// untouched; the store surfaces it as [`BackendError::PreconditionFailed`].
pub type Mutation = Box<dyn FnOnce(&mut Value) -> Result<(), String> + Send>;

/// The document store boundary.
///
/// Implementations must apply [`DocumentStore::update_if`] atomically with
/// respect to concurrent callers: the read of the current document, the guard
/// evaluation, and the write must be one indivisible step.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document and return its store-assigned id.
    ///
    /// The store stamps a `createdAt` field (epoch milliseconds, server
    /// clock) on every inserted document, giving a single authoritative
    /// ordering across all writers regardless of client clock skew.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidDocument`] when `data` is not a JSON
    /// object, or [`BackendError::Unavailable`] when the store is unreachable.
    async fn insert(&self, collection: &str, data: Value) -> Result<DocId, BackendError>;

    /// Fetch one document by id, `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unavailable`] when the store is unreachable.
    async fn get(&self, collection: &str, id: &DocId) -> Result<Option<Value>, BackendError>;

    /// Atomically apply a guarded mutation to one document.
    ///
    /// Returns the updated payload on success.
    ///
    /// # Errors
    ///
    /// - [`BackendError::NotFound`] when the document does not exist
    /// - [`BackendError::PreconditionFailed`] when the mutation's guard rejects
    /// - [`BackendError::Unavailable`] when the store is unreachable
    async fn update_if(
        &self,
        collection: &str,
        id: &DocId,
        mutation: Mutation,
    ) -> Result<Value, BackendError>;

    /// Merge fields into a document, creating it when absent.
    ///
    /// Last-writer-wins per field; used for lazily-created, single-writer
    /// records such as user profiles.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidDocument`] when `fields` is not a JSON
    /// object, or [`BackendError::Unavailable`] when the store is unreachable.
    async fn merge(&self, collection: &str, id: &DocId, fields: Value) -> Result<(), BackendError>;

    /// Delete one document.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] when the document does not exist,
    /// or [`BackendError::Unavailable`] when the store is unreachable.
    async fn delete(&self, collection: &str, id: &DocId) -> Result<(), BackendError>;

    /// Open a live subscription for a query.
    ///
    /// The subscription emits the full current result set immediately and
    /// again after every matching change. Dropping the [`Subscription`]
    /// cancels it; callers must tie its lifetime to the owning view so that
    /// every open is paired with exactly one cancel.
    fn subscribe(&self, query: QuerySpec) -> Subscription;
}

/// Counts an active subscription until dropped.
///
/// Store implementations register one guard per subscription, which lets
/// tests assert that no subscription outlives its view.
pub struct SubscriptionGuard {
    counter: Arc<AtomicUsize>,
}

impl SubscriptionGuard {
    /// Register a new active subscription on `counter`.
    #[must_use]
    pub fn register(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self { counter }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A live query: a stream of authoritative snapshots plus its cancel handle.
///
/// The cancel handle is the subscription itself — dropping it tears the
/// subscription down. This is the scoped-acquisition shape the application
/// relies on to avoid leaking subscriptions past a view's lifetime.
pub struct Subscription {
    stream: BoxStream<'static, Snapshot>,
    _guard: SubscriptionGuard,
}

impl Subscription {
    /// Pair a snapshot stream with its liveness guard.
    #[must_use]
    pub fn new(stream: BoxStream<'static, Snapshot>, guard: SubscriptionGuard) -> Self {
        Self {
            stream,
            _guard: guard,
        }
    }

    /// Wait for the next snapshot, `None` once the store shuts down.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.stream.next().await
    }
}

impl Stream for Subscription {
    type Item = Snapshot;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::into_inner(self).stream.poll_next_unpin(cx)
    }
}
