//! Application start-up: deciding whether a session exists.

pub mod bootstrap;

pub use bootstrap::{AuthState, SessionBootstrapper};
