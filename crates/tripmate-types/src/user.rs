//! Authenticated user profile.

use serde::{Deserialize, Serialize};

use crate::serde_helpers::id_as_string;

fn default_full_name() -> String {
    "User".to_string()
}

/// Response of `GET /users/info`.
///
/// `user_id` is normalized to a string so it compares directly against
/// `ChatMessage::sender_user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(deserialize_with = "id_as_string")]
    pub user_id: String,
    #[serde(default = "default_full_name")]
    pub full_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_info_defaults_name() {
        let info: UserInfo = serde_json::from_str(r#"{"userId":12}"#).unwrap();
        assert_eq!(info.user_id, "12");
        assert_eq!(info.full_name, "User");
    }
}
