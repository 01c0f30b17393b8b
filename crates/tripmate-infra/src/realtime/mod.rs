//! Realtime chat transport: STOMP 1.2 frames over a WebSocket.

pub mod stomp;
pub mod ws_transport;

pub use ws_transport::StompTransport;
