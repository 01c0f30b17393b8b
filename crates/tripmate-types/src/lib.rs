//! Shared domain types for Tripmate.
//!
//! This crate contains the types used across the Tripmate client:
//! credentials, chat rooms and messages, plan artifacts, realtime
//! connection state, session events, configuration and error enums.
//!
//! Zero IO dependencies -- only serde, chrono, thiserror.

pub mod api;
pub mod chat;
pub mod config;
pub mod credential;
pub mod error;
pub mod event;
pub mod plan;
pub mod realtime;
pub mod user;

mod serde_helpers;
