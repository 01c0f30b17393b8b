//! Session, realtime and plan-workflow logic for Tripmate.
//!
//! This crate defines the "ports" (`HttpTransport`, `RealtimeTransport`,
//! `PlanSource`, `CredentialPersistence`) that the infrastructure layer
//! implements, plus everything that runs on top of them. It depends only on
//! `tripmate-types` -- never on `tripmate-infra` or any network crate.

pub mod auth;
pub mod chat;
pub mod credential;
pub mod event;
pub mod http;
pub mod plan;
pub mod realtime;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;
