//! Wire DTOs shared by the REST endpoints.

use serde::{Deserialize, Serialize};

use crate::credential::Credential;

/// Error body returned by the backend alongside non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message in the body, if any.
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error).filter(|m| !m.trim().is_empty())
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response of `POST /auth/login` and `POST /auth/refresh`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl TokenResponse {
    /// Convert into a credential. A blank or missing token yields `None`.
    pub fn into_credential(self) -> Option<Credential> {
        let token = self.access_token.filter(|t| !t.trim().is_empty())?;
        Some(Credential::new(token, self.email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_into_credential() {
        let resp: TokenResponse =
            serde_json::from_str(r#"{"accessToken":"tok","email":"a@b.c"}"#).unwrap();
        let cred = resp.into_credential().unwrap();
        assert_eq!(cred.access_token, "tok");
        assert_eq!(cred.subject_email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn test_token_response_blank_token() {
        let resp: TokenResponse = serde_json::from_str(r#"{"accessToken":"  "}"#).unwrap();
        assert!(resp.into_credential().is_none());
    }

    #[test]
    fn test_error_body_message_preference() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"Forbidden","message":"owner only"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("owner only"));
    }
}
