//! The single source of truth for "who is signed in".
//!
//! Every write goes through [`CredentialStore::set`] or
//! [`CredentialStore::clear`], and every write publishes
//! [`SessionEvent::AuthChanged`] after the new value is visible, so a
//! subscriber reacting to the event always reads the post-write state.
//! Writes are serialized: the persisted copy never disagrees with memory.

use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use tripmate_types::credential::Credential;
use tripmate_types::error::StoreError;
use tripmate_types::event::SessionEvent;

use crate::event::EventBus;

/// Durable backing for the credential (e.g. a session file on disk).
///
/// Persistence is best effort: failures are logged by the store and never
/// turn a successful in-memory write into an error.
pub trait CredentialPersistence: Send + Sync {
    fn load(&self) -> Result<Option<Credential>, StoreError>;

    /// `None` removes the persisted credential.
    fn save(&self, credential: Option<&Credential>) -> Result<(), StoreError>;
}

pub struct CredentialStore {
    current: RwLock<Option<Arc<Credential>>>,
    bus: EventBus,
    persistence: Option<Box<dyn CredentialPersistence>>,
}

impl CredentialStore {
    pub fn new(bus: EventBus) -> Self {
        Self {
            current: RwLock::new(None),
            bus,
            persistence: None,
        }
    }

    /// Create a store backed by `persistence`, seeded from whatever it holds.
    ///
    /// Seeding does not publish an event: nobody can have subscribed to a
    /// store that does not exist yet.
    pub fn with_persistence(bus: EventBus, persistence: Box<dyn CredentialPersistence>) -> Self {
        let initial = match persistence.load() {
            Ok(credential) => credential.filter(|c| !c.access_token.is_empty()),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable persisted credential");
                None
            }
        };
        debug!(restored = initial.is_some(), "credential store initialised");
        Self {
            current: RwLock::new(initial.map(Arc::new)),
            bus,
            persistence: Some(persistence),
        }
    }

    pub fn get(&self) -> Option<Arc<Credential>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.get().map(|c| c.access_token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }

    /// Replace the current credential and announce the change.
    pub fn set(&self, credential: Credential) {
        self.replace(Some(credential));
        debug!("credential stored");
    }

    /// Remove the current credential and announce the change.
    ///
    /// Clearing an already-empty store still publishes, so listeners can
    /// treat the event as "re-read the store".
    pub fn clear(&self) {
        self.replace(None);
        debug!("credential cleared");
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Disk, memory and the event all change under one write guard, so
    /// concurrent writers land in the same order everywhere.
    fn replace(&self, credential: Option<Credential>) {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.persist(credential.as_ref());
        let authenticated = credential.is_some();
        *guard = credential.map(Arc::new);
        self.bus.publish(SessionEvent::AuthChanged { authenticated });
    }

    fn persist(&self, credential: Option<&Credential>) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        if let Err(e) = persistence.save(credential) {
            warn!(error = %e, "failed to persist credential");
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("authenticated", &self.is_authenticated())
            .field("persistent", &self.persistence.is_some())
            .finish()
    }
}
