//! `SessionBootstrapper`: the once-per-process authentication decision.
//!
//! | stored credential | outcome |
//! |---|---|
//! | present | `Authenticated`, no network call |
//! | absent  | one refresh call bounded by a timeout; success → `Authenticated`, failure or timeout → `Unauthenticated` and one `LoginRequired` event |
//!
//! Afterwards a listener keeps the published `AuthState` in line with the
//! credential store every time `AuthChanged` fires.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{OnceCell, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use tripmate_types::config::AuthConfig;
use tripmate_types::event::{LoginReason, SessionEvent};

use crate::credential::CredentialStore;
use crate::http::{HttpTransport, SessionClient};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Pending,
    Authenticated,
    Unauthenticated,
}

impl AuthState {
    pub fn is_authenticated(self) -> bool {
        self == AuthState::Authenticated
    }

    fn from_store(store: &CredentialStore) -> Self {
        if store.is_authenticated() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthState::Pending => write!(f, "pending"),
            AuthState::Authenticated => write!(f, "authenticated"),
            AuthState::Unauthenticated => write!(f, "unauthenticated"),
        }
    }
}

pub struct SessionBootstrapper<T: HttpTransport> {
    client: Arc<SessionClient<T>>,
    refresh_timeout: Duration,
    state: Arc<watch::Sender<AuthState>>,
    /// Subscribed at construction so no `AuthChanged` is missed before the
    /// listener starts.
    events: Mutex<Option<broadcast::Receiver<SessionEvent>>>,
    outcome: OnceCell<AuthState>,
}

impl<T: HttpTransport> SessionBootstrapper<T> {
    pub fn new(client: Arc<SessionClient<T>>, config: &AuthConfig) -> Self {
        let events = client.store().bus().subscribe();
        Self {
            client,
            refresh_timeout: config.bootstrap_refresh_timeout(),
            state: Arc::new(watch::Sender::new(AuthState::Pending)),
            events: Mutex::new(Some(events)),
            outcome: OnceCell::new(),
        }
    }

    pub fn state(&self) -> AuthState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Make the start-up decision. Only the first call does any work; later
    /// calls return the same outcome.
    pub async fn run(&self) -> AuthState {
        *self.outcome.get_or_init(|| self.decide()).await
    }

    async fn decide(&self) -> AuthState {
        let store = self.client.store();
        if store.is_authenticated() {
            debug!("existing credential found, skipping refresh");
            self.state.send_replace(AuthState::Authenticated);
            return AuthState::Authenticated;
        }

        let outcome = match tokio::time::timeout(self.refresh_timeout, self.client.refresh_session()).await {
            Ok(Ok(_)) => {
                info!("session restored from refresh cookie");
                AuthState::Authenticated
            }
            Ok(Err(e)) => {
                debug!(error = %e, "no session to restore");
                AuthState::Unauthenticated
            }
            Err(_) => {
                warn!(timeout = ?self.refresh_timeout, "session refresh timed out");
                AuthState::Unauthenticated
            }
        };

        self.state.send_replace(outcome);
        if outcome == AuthState::Unauthenticated {
            store.bus().publish(SessionEvent::LoginRequired {
                reason: LoginReason::NoSession,
            });
        }
        outcome
    }

    /// Keep the published state derived from the credential store for the
    /// rest of the process.
    pub fn spawn_auth_listener(&self) -> JoinHandle<()> {
        let store = Arc::clone(self.client.store());
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .unwrap_or_else(|| store.bus().subscribe());
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::AuthChanged { .. }) => {}
                    Ok(SessionEvent::LoginRequired { .. }) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "auth listener lagged, re-reading store");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
                let derived = AuthState::from_store(&store);
                state.send_if_modified(|current| {
                    if *current == derived {
                        return false;
                    }
                    debug!(from = %current, to = %derived, "auth state changed");
                    *current = derived;
                    true
                });
            }
        })
    }
}

impl<T: HttpTransport> fmt::Debug for SessionBootstrapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBootstrapper")
            .field("state", &self.state())
            .field("refresh_timeout", &self.refresh_timeout)
            .finish()
    }
}
