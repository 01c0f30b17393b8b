//! Realtime channel types: connection state and room-scoped addressing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chat::RoomId;

/// Reserved sender identity used for plan-workflow notifications.
pub const PLANNER_SENDER_ID: &str = "PLANNER";

/// Sentinel content announcing that generated plans are ready to fetch.
pub const PLAN_READY_SENTINEL: &str = "PLAN_READY";

/// State of the realtime connection for the active room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// Topic the client subscribes to for a room's inbound messages.
pub fn room_topic(room_id: RoomId) -> String {
    format!("/topic/chat/room/{room_id}")
}

/// Destination the client publishes a room's outbound messages to.
pub fn room_destination(room_id: RoomId) -> String {
    format!("/app/chat/room/{room_id}")
}
