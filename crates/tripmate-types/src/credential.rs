//! The access credential held by the client.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A short-lived bearer credential plus the identity it was issued for.
///
/// Created on login, OAuth callback or refresh; replaced wholesale on every
/// refresh and destroyed on logout or irrecoverable refresh failure. The
/// long-lived refresh cookie is not part of this type: it lives in the HTTP
/// transport and is never read by client code.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub access_token: String,
    #[serde(default, alias = "email", skip_serializing_if = "Option::is_none")]
    pub subject_email: Option<String>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, subject_email: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            subject_email,
        }
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

// The token is redacted so credentials can appear in tracing fields.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("subject_email", &self.subject_email)
            .finish()
    }
}
