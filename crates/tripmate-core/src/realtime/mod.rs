//! Supervision of the duplex message connection of the active room.

pub mod channel;
pub mod transport;

pub use channel::{ConnectionHandle, RealtimeChannel};
pub use transport::{Publish, RealtimeLink, RealtimeTransport};
