//! # MONOs Backend
//!
//! External-boundary contracts for the MONOs application.
//!
//! All durable state lives behind three narrow traits, mirroring the managed
//! services the application is deployed against:
//!
//! - [`store::DocumentStore`] — collection-based CRUD with equality-filtered,
//!   ordered, limited queries, live snapshot subscriptions, and atomic
//!   conditional updates
//! - [`auth::AuthProvider`] — sign-in/sign-out and an observable session state
//! - [`blob::BlobStore`] — upload bytes, resolve a fetchable URL
//!
//! The application core never assumes a specific engine behind these traits.
//! This crate also ships in-memory implementations ([`memory::MemoryStore`],
//! [`auth::LocalAuth`], [`blob::MemoryBlobs`]) used by the demo binary and the
//! integration tests.

pub mod auth;
pub mod blob;
pub mod memory;
pub mod store;

pub use auth::{AuthError, AuthProvider, AuthState, Identity, LocalAuth};
pub use blob::{BlobError, BlobRef, BlobStore, MemoryBlobs};
pub use memory::MemoryStore;
pub use store::{
    BackendError, Direction, DocId, Document, DocumentStore, Mutation, QuerySpec, Snapshot,
    Subscription, SubscriptionGuard,
};
