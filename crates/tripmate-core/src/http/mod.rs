//! Authenticated REST access with transparent credential refresh.

pub mod client;
pub mod request;
pub mod transport;

pub use client::SessionClient;
pub use request::{ApiRequest, Attempt, Method, RawResponse};
pub use transport::HttpTransport;
