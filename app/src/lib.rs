//! # MONOs
//!
//! Core of a mobile-first event-meetup application: users browse and create
//! local social events, join them through a deposit-based reservation flow,
//! and chat in per-event rooms.
//!
//! Every feature is a pure reducer driven by a [`monos_runtime::Store`]; all
//! durable state lives behind the `monos-backend` boundary traits. Views
//! observe live collections as snapshot streams and advance local state only
//! on backend confirmation.

pub mod config;
pub mod features;
pub mod live;
pub mod queries;
pub mod repo;
pub mod seed;
pub mod types;

pub use live::LiveQuery;
pub use repo::{JoinError, Repo, RepoError};
