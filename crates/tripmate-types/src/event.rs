//! Session events broadcast across the client.
//!
//! `SessionEvent` is the application-wide notification type. Every variant
//! is Clone + Send + Sync for use with tokio broadcast channels.

use serde::{Deserialize, Serialize};

/// Why the user has to go back to the login entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginReason {
    /// A 401-triggered refresh was rejected by the server.
    RefreshRejected,
    /// No session could be restored at startup.
    NoSession,
}

/// Events published on the session event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The credential store was written or cleared.
    AuthChanged { authenticated: bool },

    /// The session is gone and the user must log in again.
    LoginRequired { reason: LoginReason },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_tag() {
        let json = serde_json::to_string(&SessionEvent::AuthChanged { authenticated: true }).unwrap();
        assert!(json.contains("\"type\":\"auth_changed\""));
        assert!(json.contains("\"authenticated\":true"));
    }
}
