//! Process-wide holder of the current credential.

pub mod store;

pub use store::{CredentialPersistence, CredentialStore};
