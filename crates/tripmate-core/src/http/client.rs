//! `SessionClient`: attaches the bearer credential to every request and
//! recovers from an expired access token by exchanging the refresh cookie.
//!
//! Recovery rules:
//! - only a 401 on a non-auth endpoint triggers a refresh, and only on the
//!   first attempt of a logical request;
//! - refreshes are single-flight: concurrent 401s wait on one gate, and
//!   whoever gets the gate second reuses the outcome of the first refresh
//!   instead of issuing another;
//! - the refresh call goes straight to the transport, so it can never
//!   re-enter this recovery path;
//! - a rejected refresh clears the credential store and publishes
//!   `LoginRequired` once, and the caller receives the original error.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use tripmate_types::api::TokenResponse;
use tripmate_types::credential::Credential;
use tripmate_types::error::{AuthError, HttpError};
use tripmate_types::event::{LoginReason, SessionEvent};

use crate::credential::CredentialStore;

use super::request::{ApiRequest, Attempt, REFRESH_PATH, RawResponse};
use super::transport::HttpTransport;

pub struct SessionClient<T: HttpTransport> {
    transport: T,
    store: Arc<CredentialStore>,
    refresh_gate: Mutex<()>,
    /// Bumped every time a refresh completes, successfully or not.
    refresh_epoch: AtomicU64,
}

impl<T: HttpTransport> SessionClient<T> {
    pub fn new(transport: T, store: Arc<CredentialStore>) -> Self {
        Self {
            transport,
            store,
            refresh_gate: Mutex::new(()),
            refresh_epoch: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `request`, refreshing the credential and resubmitting once if
    /// the server reports the access token as expired.
    ///
    /// Non-2xx responses come back as `Err`; `HttpError::Network` means the
    /// server never answered.
    pub async fn request(&self, request: &ApiRequest) -> Result<RawResponse, HttpError> {
        let mut attempt = Attempt::Initial;
        loop {
            let epoch = self.refresh_epoch.load(Ordering::Acquire);
            let credential = self.store.get();
            let bearer = credential.as_ref().map(|c| c.bearer());

            debug!(
                request_id = %request.id,
                method = %request.method,
                path = %request.path,
                ?attempt,
                authenticated = bearer.is_some(),
                "sending request"
            );
            let response = self.transport.execute(request, bearer.as_deref()).await?;
            if response.is_success() {
                return Ok(response);
            }

            let eligible = response.status == 401
                && !request.is_auth_endpoint()
                && attempt.may_refresh();
            if !eligible {
                debug!(request_id = %request.id, status = response.status, "request failed");
                return Err(response.into_error());
            }

            let used_token = credential.map(|c| c.access_token.clone());
            if !self.recover(epoch, used_token.as_deref()).await {
                return Err(response.into_error());
            }
            debug!(request_id = %request.id, "resubmitting after credential refresh");
            attempt = Attempt::Retried;
        }
    }

    /// GET `path` and decode its (optionally enveloped) JSON payload.
    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, HttpError> {
        self.request(&ApiRequest::get(path)).await?.data()
    }

    /// Send `request` and decode its (optionally enveloped) JSON payload.
    pub async fn send_json<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, HttpError> {
        self.request(&request).await?.data()
    }

    /// Send `request` and discard the response body.
    pub async fn send_unit(&self, request: ApiRequest) -> Result<(), HttpError> {
        self.request(&request).await.map(|_| ())
    }

    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, HttpError> {
        Ok(self.request(&ApiRequest::get(path)).await?.body)
    }

    /// Exchange the refresh cookie for a new credential and store it.
    ///
    /// Unlike the automatic recovery inside [`request`](Self::request), a
    /// failure here has no side effects: the store is left as it was and no
    /// event is published. The caller decides what a failure means.
    pub async fn refresh_session(&self) -> Result<Credential, AuthError> {
        let _gate = self.refresh_gate.lock().await;
        let result = self.exchange_refresh_cookie().await;
        self.refresh_epoch.fetch_add(1, Ordering::AcqRel);
        let credential = result?;
        self.store.set(credential.clone());
        info!("session refreshed");
        Ok(credential)
    }

    /// Returns `true` when the failed request should be resubmitted.
    async fn recover(&self, epoch_seen: u64, used_token: Option<&str>) -> bool {
        let _gate = self.refresh_gate.lock().await;

        if self.refresh_epoch.load(Ordering::Acquire) != epoch_seen {
            // A refresh finished while this request was in flight.
            return self.store.is_authenticated();
        }
        let current = self.store.access_token();
        if current.is_some() && current.as_deref() != used_token {
            // Credential replaced by a login since the request was sent.
            return true;
        }

        let result = self.exchange_refresh_cookie().await;
        self.refresh_epoch.fetch_add(1, Ordering::AcqRel);
        match result {
            Ok(credential) => {
                self.store.set(credential);
                info!("access token refreshed");
                true
            }
            Err(e) => {
                warn!(error = %e, "refresh rejected, ending session");
                self.store.clear();
                self.store.bus().publish(SessionEvent::LoginRequired {
                    reason: LoginReason::RefreshRejected,
                });
                false
            }
        }
    }

    async fn exchange_refresh_cookie(&self) -> Result<Credential, AuthError> {
        let request = ApiRequest::post(REFRESH_PATH);
        debug!(request_id = %request.id, "exchanging refresh cookie");
        let response = self.transport.execute(&request, None).await?;
        if !response.is_success() {
            return Err(response.into_error().into());
        }
        let token: TokenResponse = response.data()?;
        let mut credential = token.into_credential().ok_or(AuthError::EmptyToken)?;
        if credential.subject_email.is_none() {
            credential.subject_email = self.store.get().and_then(|c| c.subject_email.clone());
        }
        Ok(credential)
    }
}

impl<T: HttpTransport> std::fmt::Debug for SessionClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("store", &self.store)
            .field("refresh_epoch", &self.refresh_epoch.load(Ordering::Relaxed))
            .finish()
    }
}
