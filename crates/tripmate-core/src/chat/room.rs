//! State of the room the user is currently in.

use tracing::{info, warn};

use tripmate_types::chat::{ChatRoom, DEFAULT_ROOM_NAME, OutgoingMessage, RoomId};
use tripmate_types::error::RoomError;
use tripmate_types::plan::PlanArtifact;
use tripmate_types::user::UserInfo;

use crate::http::HttpTransport;

use super::api::ChatApi;
use super::log::MessageLog;

/// `{origin}/chat/room/{id}`, the link other users open to join.
pub fn invite_url(web_origin: &str, room_id: RoomId) -> String {
    format!("{}/chat/room/{room_id}", web_origin.trim_end_matches('/'))
}

#[derive(Debug, Clone)]
pub struct RoomSession {
    pub room: ChatRoom,
    pub user: UserInfo,
    pub log: MessageLog,
    pub plans: Vec<PlanArtifact>,
}

impl RoomSession {
    /// Fetch everything needed to show a room.
    ///
    /// User info, room metadata, history and the plan list are requested
    /// concurrently. A missing room is `RoomError::NotFound`; a failed plan
    /// list only leaves the list empty.
    pub async fn enter<T: HttpTransport>(
        api: &ChatApi<T>,
        room_id: RoomId,
        history_limit: u32,
    ) -> Result<Self, RoomError> {
        let (user, room, history, plans) = tokio::join!(
            api.user_info(),
            api.get_room(room_id),
            api.recent_messages(room_id, history_limit),
            api.list_plans(room_id),
        );
        let room = room?;
        let user = user?;
        let history = history?;
        let plans = plans.unwrap_or_else(|e| {
            warn!(%room_id, error = %e, "could not load plan list");
            Vec::new()
        });

        let mut log = MessageLog::new();
        log.load_history(history);
        info!(%room_id, messages = log.len(), plans = plans.len(), "entered room");
        Ok(Self {
            room,
            user,
            log,
            plans,
        })
    }

    pub fn room_id(&self) -> RoomId {
        self.room.id
    }

    /// Rename the room. A blank name means the default name. Returns
    /// `Ok(false)` without contacting the server when nothing would change.
    pub async fn rename<T: HttpTransport>(
        &mut self,
        api: &ChatApi<T>,
        requested: &str,
    ) -> Result<bool, RoomError> {
        let name = match requested.trim() {
            "" => DEFAULT_ROOM_NAME,
            trimmed => trimmed,
        };
        if self.room.name.as_deref() == Some(name) {
            return Ok(false);
        }

        match api.rename_room(self.room.id, name).await? {
            Some(updated) => self.room = updated,
            None => self.room.name = Some(name.to_string()),
        }
        Ok(true)
    }

    /// The payload for sending `text` as the current user, or `None` when
    /// there is nothing to send.
    pub fn outgoing(&self, text: &str) -> Option<OutgoingMessage> {
        let content = text.trim();
        if content.is_empty() {
            return None;
        }
        Some(OutgoingMessage {
            sender_user_id: self.user.user_id.clone(),
            sender_user_name: self.user.full_name.clone(),
            content: content.to_string(),
        })
    }

    pub fn invite_url(&self, web_origin: &str) -> String {
        invite_url(web_origin, self.room.id)
    }

    pub fn is_own(&self, sender_user_id: &str) -> bool {
        self.user.user_id == sender_user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::credential::CredentialStore;
    use crate::event::EventBus;
    use crate::http::{Method, RawResponse, SessionClient};
    use crate::test_support::FakeHttp;
    use tripmate_types::credential::Credential;

    fn chat_api(http: FakeHttp) -> ChatApi<FakeHttp> {
        let store = Arc::new(CredentialStore::new(EventBus::default()));
        store.set(Credential::new("tok", None));
        ChatApi::new(Arc::new(SessionClient::new(http, store)), "/v1")
    }

    fn backend(plans_ok: bool) -> FakeHttp {
        FakeHttp::new(move |req, _| {
            let body = match (req.method, req.path.as_str()) {
                (Method::Get, "/v1/users/info") => json!({"data": {"userId": 7, "fullName": "Kim"}}),
                (Method::Get, "/v1/chat/rooms/3") => json!({"data": {"id": 3, "name": "Jeju"}}),
                (Method::Get, "/v1/chat/rooms/3/messages?limit=50") => json!({"data": [
                    {"id": 1, "senderUserId": "7", "content": "first"},
                    {"id": 2, "senderUserId": "PLANNER", "content": "hello", "type": "SYSTEM"}
                ]}),
                (Method::Get, "/v1/chat/rooms/3/plans") if plans_ok => {
                    json!({"data": [{"id": 1, "fileName": "jeju.pdf"}]})
                }
                (Method::Get, "/v1/chat/rooms/3/plans") => return Ok(RawResponse::new(500, "")),
                (Method::Put, "/v1/chat/rooms/3") => json!({"data": {"id": 3, "name": "Busan"}}),
                _ => return Ok(RawResponse::new(404, "")),
            };
            Ok(RawResponse::from_json(200, &body))
        })
    }

    #[tokio::test]
    async fn test_enter_loads_everything() {
        let api = chat_api(backend(true));
        let session = RoomSession::enter(&api, RoomId(3), 50).await.unwrap();

        assert_eq!(session.room.display_name(), "Jeju");
        assert_eq!(session.user.user_id, "7");
        assert_eq!(session.log.len(), 2);
        assert!(session.log.messages()[1].is_from_planner());
        assert_eq!(session.plans.len(), 1);
    }

    #[tokio::test]
    async fn test_enter_tolerates_plan_failure() {
        let api = chat_api(backend(false));
        let session = RoomSession::enter(&api, RoomId(3), 50).await.unwrap();
        assert!(session.plans.is_empty());
        assert_eq!(session.log.len(), 2);
    }

    #[tokio::test]
    async fn test_enter_missing_room() {
        let api = chat_api(backend(true));
        let err = RoomSession::enter(&api, RoomId(99), 50).await.unwrap_err();
        assert!(matches!(err, RoomError::NotFound(RoomId(99))));
    }

    #[tokio::test]
    async fn test_rename_unchanged_sends_nothing() {
        let http = backend(true);
        let calls = http.calls();
        let api = chat_api(http);
        let mut session = RoomSession::enter(&api, RoomId(3), 50).await.unwrap();
        let before = calls.lock().unwrap().len();

        assert!(!session.rename(&api, "  Jeju ").await.unwrap());
        assert_eq!(calls.lock().unwrap().len(), before);
    }

    #[tokio::test]
    async fn test_rename_applies_server_echo() {
        let api = chat_api(backend(true));
        let mut session = RoomSession::enter(&api, RoomId(3), 50).await.unwrap();

        assert!(session.rename(&api, "Busan").await.unwrap());
        assert_eq!(session.room.display_name(), "Busan");
    }

    #[tokio::test]
    async fn test_rename_blank_uses_default_name() {
        let http = backend(true);
        let calls = http.calls();
        let api = chat_api(http);
        let mut session = RoomSession::enter(&api, RoomId(3), 50).await.unwrap();

        session.rename(&api, "   ").await.unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.last().unwrap().body, Some(json!({"name": "채팅방"})));
    }

    #[tokio::test]
    async fn test_outgoing_attributes_current_user() {
        let api = chat_api(backend(true));
        let session = RoomSession::enter(&api, RoomId(3), 50).await.unwrap();

        assert!(session.outgoing("   ").is_none());
        let out = session.outgoing("  일정 짜줘 ").unwrap();
        assert_eq!(out.sender_user_id, "7");
        assert_eq!(out.sender_user_name, "Kim");
        assert_eq!(out.content, "일정 짜줘");
        assert!(session.is_own("7"));
    }

    #[test]
    fn test_invite_url() {
        assert_eq!(
            invite_url("http://localhost:5173/", RoomId(12)),
            "http://localhost:5173/chat/room/12"
        );
    }
}
