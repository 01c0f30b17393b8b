//! Chat room and message types.
//!
//! Rooms are fetched over REST on entry; messages arrive both as REST
//! history and as realtime frames. Both paths deserialize into the same
//! `ChatMessage` shape.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::realtime::PLANNER_SENDER_ID;
use crate::serde_helpers::{id_as_string, lenient_timestamp};

/// Default name used when a room has no name or a rename is blank.
pub const DEFAULT_ROOM_NAME: &str = "채팅방";

/// Server-assigned room identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub i64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RoomId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(RoomId)
            .map_err(|_| format!("invalid room id: '{s}'"))
    }
}

/// A chat room as returned by `GET /chat/rooms` and `GET /chat/rooms/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoom {
    pub id: RoomId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "ownerDisplayName")]
    pub created_by_user_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ChatRoom {
    /// Name to display, falling back to the default room name.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => DEFAULT_ROOM_NAME,
        }
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageKind {
    #[default]
    User,
    #[serde(alias = "BOT")]
    System,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::User => write!(f, "user"),
            MessageKind::System => write!(f, "system"),
        }
    }
}

/// A single chat message.
///
/// `id` is absent for messages that have not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(deserialize_with = "id_as_string")]
    pub sender_user_id: String,
    #[serde(default)]
    pub sender_user_name: Option<String>,
    pub content: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "type")]
    pub kind: MessageKind,
}

impl ChatMessage {
    /// Whether this message was sent by the reserved planner identity.
    pub fn is_from_planner(&self) -> bool {
        self.sender_user_id == PLANNER_SENDER_ID
    }

    /// Effective kind: planner messages are system messages regardless of
    /// what the `type` field says.
    pub fn effective_kind(&self) -> MessageKind {
        if self.is_from_planner() {
            MessageKind::System
        } else {
            self.kind
        }
    }

    /// Sender name to display.
    pub fn display_sender(&self) -> &str {
        self.sender_user_name.as_deref().unwrap_or("알 수 없음")
    }
}

/// Payload published to the room destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub sender_user_id: String,
    pub sender_user_name: String,
    pub content: String,
}

/// Body of `POST /chat/rooms` and `PUT /chat/rooms/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomName {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_parse() {
        assert_eq!("42".parse::<RoomId>().unwrap(), RoomId(42));
        assert!("abc".parse::<RoomId>().is_err());
    }

    #[test]
    fn test_room_deserialize_spring_shape() {
        let json = r#"{"id":7,"name":"부산 여행","createdByUserName":"민지","createdAt":"2025-05-01T09:30:00"}"#;
        let room: ChatRoom = serde_json::from_str(json).unwrap();
        assert_eq!(room.id, RoomId(7));
        assert_eq!(room.display_name(), "부산 여행");
        assert_eq!(room.created_by_user_name.as_deref(), Some("민지"));
        assert!(room.created_at.is_some());
    }

    #[test]
    fn test_room_display_name_fallback() {
        let room = ChatRoom {
            id: RoomId(1),
            name: Some("   ".to_string()),
            created_by_user_name: None,
            created_at: None,
        };
        assert_eq!(room.display_name(), DEFAULT_ROOM_NAME);
    }

    #[test]
    fn test_message_numeric_sender_id() {
        let json = r#"{"id":1,"senderUserId":15,"senderUserName":"Kim","content":"hi"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.sender_user_id, "15");
        assert_eq!(msg.kind, MessageKind::User);
        assert!(msg.created_at.is_none());
    }

    #[test]
    fn test_planner_message_is_system() {
        let json = r#"{"senderUserId":"PLANNER","content":"PLAN_READY"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert!(msg.is_from_planner());
        assert_eq!(msg.effective_kind(), MessageKind::System);
        assert_eq!(msg.display_sender(), "알 수 없음");
    }

    #[test]
    fn test_bot_type_alias() {
        let json = r#"{"senderUserId":"x","content":"hello","type":"BOT"}"#;
        let msg: ChatMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.kind, MessageKind::System);
    }

    #[test]
    fn test_outgoing_message_wire_shape() {
        let out = OutgoingMessage {
            sender_user_id: "3".to_string(),
            sender_user_name: "Lee".to_string(),
            content: "일정 짜줘".to_string(),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["senderUserId"], "3");
        assert_eq!(json["senderUserName"], "Lee");
        assert_eq!(json["content"], "일정 짜줘");
    }
}
