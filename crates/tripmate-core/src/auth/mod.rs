//! Sign-in, sign-out and account operations.

pub mod oauth;
pub mod service;

pub use service::AuthApi;
