//! Infrastructure layer for Tripmate.
//!
//! Contains implementations of the ports defined in `tripmate-core`:
//! a reqwest HTTP transport that keeps the refresh cookie in its own jar,
//! a STOMP-over-WebSocket realtime transport, the on-disk session file and
//! the config file loader.

pub mod config;
pub mod http;
pub mod realtime;
pub mod session_file;
