//! Application context wiring the client together.
//!
//! AppContext holds the concrete service instances used by the CLI commands.
//! Core services are generic over transport traits; AppContext pins them to
//! the reqwest and STOMP implementations from `tripmate-infra`.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use tripmate_core::auth::AuthApi;
use tripmate_core::chat::ChatApi;
use tripmate_core::credential::CredentialStore;
use tripmate_core::event::EventBus;
use tripmate_core::http::SessionClient;
use tripmate_core::session::{AuthState, SessionBootstrapper};
use tripmate_infra::config::{load_client_config, resolve_data_dir, validate};
use tripmate_infra::http::ReqwestTransport;
use tripmate_infra::session_file::SessionFile;
use tripmate_types::config::ClientConfig;

pub type ConcreteClient = SessionClient<ReqwestTransport>;
pub type ConcreteChatApi = ChatApi<ReqwestTransport>;

/// Endpoint overrides from command-line flags.
#[derive(Debug, Default)]
pub struct EndpointOverrides {
    pub api_url: Option<String>,
    pub ws_url: Option<String>,
}

pub struct AppContext {
    pub config: ClientConfig,
    pub data_dir: PathBuf,
    pub client: Arc<ConcreteClient>,
    pub auth: AuthApi<ReqwestTransport>,
    pub chat: ConcreteChatApi,
    pub bootstrapper: SessionBootstrapper<ReqwestTransport>,
    session_file: SessionFile,
}

impl AppContext {
    /// Load configuration, restore the persisted session and wire services.
    pub async fn init(overrides: EndpointOverrides) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;

        let mut config = load_client_config(&data_dir).await?;
        if let Some(url) = overrides.api_url {
            config.api.base_url = url;
        }
        if let Some(url) = overrides.ws_url {
            config.realtime.url = url;
        }
        validate(&config)?;

        let session_file = SessionFile::new(&data_dir);
        let transport = ReqwestTransport::new(&config.api.base_url, config.api.request_timeout())?;
        match session_file.read() {
            Ok(state) => {
                if let Some(cookies) = state.cookies {
                    transport.import_cookies(&cookies);
                    debug!("restored refresh cookie from {}", session_file.path().display());
                }
            }
            Err(e) => warn!(error = %e, "ignoring unreadable session file"),
        }

        let store = Arc::new(CredentialStore::with_persistence(
            EventBus::default(),
            Box::new(session_file.clone()),
        ));
        let client = Arc::new(SessionClient::new(transport, store));
        let auth = AuthApi::new(Arc::clone(&client));
        let chat = ChatApi::new(Arc::clone(&client), config.api.resource_prefix.clone());
        let bootstrapper = SessionBootstrapper::new(Arc::clone(&client), &config.auth);

        Ok(Self {
            config,
            data_dir,
            client,
            auth,
            chat,
            bootstrapper,
            session_file,
        })
    }

    pub fn store(&self) -> &Arc<CredentialStore> {
        self.client.store()
    }

    /// Resolve the start-up session, failing with a login hint when there is none.
    pub async fn require_session(&self) -> anyhow::Result<()> {
        match self.bootstrapper.run().await {
            AuthState::Authenticated => Ok(()),
            _ => anyhow::bail!("Not logged in. Run `tripmate login` first."),
        }
    }

    /// Write the cookie jar back to disk so the next run can refresh.
    pub fn persist_cookies(&self) {
        let cookies = self.client.transport().export_cookies();
        if let Err(e) = self.session_file.save_cookies(cookies) {
            warn!(error = %e, "could not save session cookies");
        }
    }

    /// Drop the persisted cookies. The credential is cleared through the store.
    pub fn forget_session(&self) {
        if let Err(e) = self.session_file.save_cookies(None) {
            warn!(error = %e, "could not remove session cookies");
        }
    }
}
