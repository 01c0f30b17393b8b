//! Typed wrappers over the chat REST endpoints.

use std::sync::Arc;

use tracing::debug;

use tripmate_types::chat::{ChatMessage, ChatRoom, RoomId, RoomName};
use tripmate_types::error::{HttpError, RoomError};
use tripmate_types::plan::PlanArtifact;
use tripmate_types::user::UserInfo;

use crate::http::{ApiRequest, HttpTransport, SessionClient};
use crate::plan::PlanSource;

pub struct ChatApi<T: HttpTransport> {
    client: Arc<SessionClient<T>>,
    prefix: String,
}

impl<T: HttpTransport> Clone for ChatApi<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            prefix: self.prefix.clone(),
        }
    }
}

impl<T: HttpTransport> ChatApi<T> {
    /// `prefix` is prepended to every resource path (e.g. `/v1`).
    pub fn new(client: Arc<SessionClient<T>>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn client(&self) -> &Arc<SessionClient<T>> {
        &self.client
    }

    fn rooms_path(&self) -> String {
        format!("{}/chat/rooms", self.prefix)
    }

    fn room_path(&self, room_id: RoomId) -> String {
        format!("{}/chat/rooms/{room_id}", self.prefix)
    }

    pub async fn user_info(&self) -> Result<UserInfo, HttpError> {
        self.client
            .get_json(&format!("{}/users/info", self.prefix))
            .await
    }

    pub async fn list_rooms(&self) -> Result<Vec<ChatRoom>, HttpError> {
        let rooms: Option<Vec<ChatRoom>> = self.client.get_json(&self.rooms_path()).await?;
        Ok(rooms.unwrap_or_default())
    }

    pub async fn create_room(&self, name: &str) -> Result<ChatRoom, HttpError> {
        let request = ApiRequest::post(self.rooms_path()).json(&RoomName {
            name: name.to_string(),
        })?;
        self.client.send_json(request).await
    }

    pub async fn get_room(&self, room_id: RoomId) -> Result<ChatRoom, RoomError> {
        self.client
            .get_json(&self.room_path(room_id))
            .await
            .map_err(|e| match e {
                HttpError::NotFound => RoomError::NotFound(room_id),
                other => RoomError::Http(other),
            })
    }

    /// Rename a room. Only the owner may do this; the server answers 403
    /// to everyone else. Returns the updated room when the server echoes it.
    pub async fn rename_room(
        &self,
        room_id: RoomId,
        name: &str,
    ) -> Result<Option<ChatRoom>, RoomError> {
        let request = ApiRequest::put(self.room_path(room_id)).json(&RoomName {
            name: name.to_string(),
        })?;
        self.client
            .send_json(request)
            .await
            .map_err(|e| match e.status() {
                Some(403) => RoomError::PermissionDenied,
                Some(404) => RoomError::NotFound(room_id),
                _ => RoomError::Http(e),
            })
    }

    pub async fn leave_room(&self, room_id: RoomId) -> Result<(), HttpError> {
        let path = format!("{}/leave", self.room_path(room_id));
        self.client.send_unit(ApiRequest::post(path)).await
    }

    /// The last `limit` messages of a room, oldest first.
    pub async fn recent_messages(
        &self,
        room_id: RoomId,
        limit: u32,
    ) -> Result<Vec<ChatMessage>, HttpError> {
        let path = format!("{}/messages?limit={limit}", self.room_path(room_id));
        let messages: Option<Vec<ChatMessage>> = self.client.get_json(&path).await?;
        Ok(messages.unwrap_or_default())
    }

    pub async fn list_plans(&self, room_id: RoomId) -> Result<Vec<PlanArtifact>, HttpError> {
        let path = format!("{}/plans", self.room_path(room_id));
        let plans: Option<Vec<PlanArtifact>> = self.client.get_json(&path).await?;
        Ok(plans.unwrap_or_default())
    }

    /// Download a plan document. Expired artifacts are refused locally
    /// without contacting the server.
    pub async fn download_plan(
        &self,
        room_id: RoomId,
        artifact: &PlanArtifact,
    ) -> Result<Vec<u8>, HttpError> {
        if !artifact.downloadable {
            debug!(plan_id = artifact.id, "refusing to download expired plan");
            return Err(HttpError::PlanExpired);
        }
        let path = format!("{}/plans/{}/download", self.room_path(room_id), artifact.id);
        self.client.get_bytes(&path).await
    }
}

impl<T: HttpTransport> PlanSource for ChatApi<T> {
    fn list_plans(
        &self,
        room_id: RoomId,
    ) -> impl std::future::Future<Output = Result<Vec<PlanArtifact>, HttpError>> + Send {
        ChatApi::list_plans(self, room_id)
    }
}
