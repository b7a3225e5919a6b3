//! Feature reducers.
//!
//! One module per user-facing feature, each a pure reducer driven by a
//! `Store`. Commands validate against current state, side effects run as
//! effect descriptions, and state only advances on the confirmation action
//! the effect feeds back.

pub mod authoring;
pub mod chat;
pub mod feed;
pub mod profile;
pub mod reservation;
pub mod rooms;
pub mod session;
