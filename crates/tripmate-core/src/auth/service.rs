//! Password login, logout and account withdrawal.
//!
//! Logout and withdrawal always end the local session, even when the
//! server call fails.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, warn};

use tripmate_types::api::{LoginRequest, TokenResponse};
use tripmate_types::credential::Credential;
use tripmate_types::error::{AuthError, HttpError};

use crate::credential::CredentialStore;
use crate::http::{ApiRequest, HttpTransport, SessionClient};

pub struct AuthApi<T: HttpTransport> {
    client: Arc<SessionClient<T>>,
}

impl<T: HttpTransport> AuthApi<T> {
    pub fn new(client: Arc<SessionClient<T>>) -> Self {
        Self { client }
    }

    fn store(&self) -> &Arc<CredentialStore> {
        self.client.store()
    }

    /// POST `/auth/login`; on success the returned credential is stored.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<Credential, AuthError> {
        let request = ApiRequest::post("/auth/login").json(&LoginRequest {
            email,
            password: password.expose_secret(),
        })?;
        let token: TokenResponse = self.client.send_json(request).await?;
        let mut credential = token.into_credential().ok_or(AuthError::EmptyToken)?;
        if credential.subject_email.is_none() {
            credential.subject_email = Some(email.to_string());
        }
        self.store().set(credential.clone());
        info!("logged in");
        Ok(credential)
    }

    /// POST `/auth/logout`, then clear the local session regardless of the
    /// outcome. The server error, if any, is returned after clearing.
    pub async fn logout(&self) -> Result<(), HttpError> {
        let result = self.client.send_unit(ApiRequest::post("/auth/logout")).await;
        if let Err(e) = &result {
            warn!(error = %e, "logout call failed, clearing local session anyway");
        }
        self.store().clear();
        info!("logged out");
        result
    }

    /// DELETE `/auth/withdraw`, then clear the local session regardless of
    /// the outcome.
    pub async fn withdraw(&self) -> Result<(), HttpError> {
        let result = self.client.send_unit(ApiRequest::delete("/auth/withdraw")).await;
        if let Err(e) = &result {
            warn!(error = %e, "withdraw call failed, clearing local session anyway");
        }
        self.store().clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBus;
    use crate::http::{Method, RawResponse};
    use crate::test_support::FakeHttp;
    use serde_json::json;

    fn auth_api(http: FakeHttp) -> (AuthApi<FakeHttp>, Arc<CredentialStore>) {
        let store = Arc::new(CredentialStore::new(EventBus::default()));
        let client = Arc::new(SessionClient::new(http, store.clone()));
        (AuthApi::new(client), store)
    }

    #[tokio::test]
    async fn login_stores_credential() {
        let http = FakeHttp::new(|_, _| {
            Ok(RawResponse::from_json(200, &json!({"accessToken": "tok", "email": "a@b.c"})))
        });
        let calls = http.calls();
        let (api, store) = auth_api(http);

        let credential = api
            .login("a@b.c", &SecretString::from("pw".to_string()))
            .await
            .unwrap();

        assert_eq!(credential.access_token, "tok");
        assert_eq!(store.access_token().as_deref(), Some("tok"));
        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].method, Method::Post);
        assert_eq!(calls[0].path, "/auth/login");
        assert_eq!(calls[0].body, Some(json!({"email": "a@b.c", "password": "pw"})));
    }

    #[tokio::test]
    async fn login_rejected_leaves_store_empty() {
        let http = FakeHttp::new(|_, _| {
            Ok(RawResponse::from_json(401, &json!({"message": "bad credentials"})))
        });
        let calls = http.calls();
        let (api, store) = auth_api(http);

        let err = api
            .login("a@b.c", &SecretString::from("wrong".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Http(ref e) if e.is_unauthorized()));
        assert!(!store.is_authenticated());
        // No refresh attempt for an auth endpoint.
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn login_without_email_in_response_uses_input() {
        let http = FakeHttp::new(|_, _| {
            Ok(RawResponse::from_json(200, &json!({"data": {"accessToken": "tok"}})))
        });
        let (api, store) = auth_api(http);

        api.login("me@trip.kr", &SecretString::from("pw".to_string()))
            .await
            .unwrap();

        assert_eq!(
            store.get().unwrap().subject_email.as_deref(),
            Some("me@trip.kr")
        );
    }

    #[tokio::test]
    async fn logout_clears_even_when_server_fails() {
        let http = FakeHttp::new(|_, _| Err(HttpError::Network("down".into())));
        let (api, store) = auth_api(http);
        store.set(Credential::new("tok", None));

        assert!(api.logout().await.is_err());
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn withdraw_sends_delete_and_clears() {
        let http = FakeHttp::new(|_, _| Ok(RawResponse::new(200, "")));
        let calls = http.calls();
        let (api, store) = auth_api(http);
        store.set(Credential::new("tok", None));

        api.withdraw().await.unwrap();

        assert!(!store.is_authenticated());
        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].method, Method::Delete);
        assert_eq!(calls[0].path, "/auth/withdraw");
        assert_eq!(calls[0].bearer.as_deref(), Some("Bearer tok"));
    }
}
