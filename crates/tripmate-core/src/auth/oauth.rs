//! OAuth redirect handling.

use tracing::info;
use url::Url;

use tripmate_types::credential::Credential;
use tripmate_types::error::{AuthError, ConfigError};

use crate::credential::CredentialStore;

/// Complete a login from the identity provider's redirect URL.
///
/// The callback carries `accessToken` and optionally `email` as query
/// parameters. A missing or blank token is an authentication failure.
pub fn complete_callback(callback_url: &str, store: &CredentialStore) -> Result<Credential, AuthError> {
    let url =
        Url::parse(callback_url).map_err(|e| AuthError::InvalidCallbackUrl(e.to_string()))?;

    let mut access_token = None;
    let mut email = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "accessToken" => access_token = Some(value.into_owned()),
            "email" => email = Some(value.into_owned()),
            _ => {}
        }
    }

    let access_token = access_token
        .filter(|t| !t.trim().is_empty())
        .ok_or(AuthError::MissingAccessToken)?;
    let credential = Credential::new(access_token, email.filter(|e| !e.is_empty()));
    store.set(credential.clone());
    info!("oauth login completed");
    Ok(credential)
}

/// The URL that starts the provider's authorization flow, e.g.
/// `http://localhost:8080/oauth2/authorization/google` for an API base of
/// `http://localhost:8080/api`.
pub fn authorization_url(api_base_url: &str, provider: &str) -> Result<Url, ConfigError> {
    let base = Url::parse(api_base_url)
        .map_err(|_| ConfigError::InvalidUrl(api_base_url.to_string()))?;
    base.join(&format!("/oauth2/authorization/{provider}"))
        .map_err(|_| ConfigError::InvalidUrl(api_base_url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBus;
    use tripmate_types::event::SessionEvent;

    #[tokio::test]
    async fn test_callback_stores_credential_and_announces() {
        let bus = EventBus::default();
        let store = CredentialStore::new(bus.clone());
        let mut rx = bus.subscribe();

        let credential = complete_callback(
            "http://localhost:5173/auth/callback?accessToken=abc.def&email=me%40trip.kr",
            &store,
        )
        .unwrap();

        assert_eq!(credential.access_token, "abc.def");
        assert_eq!(credential.subject_email.as_deref(), Some("me@trip.kr"));
        assert_eq!(store.access_token().as_deref(), Some("abc.def"));
        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::AuthChanged { authenticated: true }
        );
    }

    #[test]
    fn test_callback_without_token_fails() {
        let store = CredentialStore::new(EventBus::default());
        let err = complete_callback("http://localhost:5173/auth/callback?email=a@b.c", &store)
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingAccessToken));
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_callback_blank_token_fails() {
        let store = CredentialStore::new(EventBus::default());
        let err =
            complete_callback("http://x/auth/callback?accessToken=", &store).unwrap_err();
        assert!(matches!(err, AuthError::MissingAccessToken));
    }

    #[test]
    fn test_callback_email_optional() {
        let store = CredentialStore::new(EventBus::default());
        let credential = complete_callback("http://x/cb?accessToken=t", &store).unwrap();
        assert!(credential.subject_email.is_none());
    }

    #[test]
    fn test_callback_rejects_garbage() {
        let store = CredentialStore::new(EventBus::default());
        let err = complete_callback("not a url", &store).unwrap_err();
        assert!(matches!(err, AuthError::InvalidCallbackUrl(_)));
    }

    #[test]
    fn test_authorization_url() {
        let url = authorization_url("http://localhost:8080/api", "google").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/oauth2/authorization/google");
    }
}
