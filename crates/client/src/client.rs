//! The composition root of the client layer.

use std::sync::Arc;

use tracing::info;

use crate::config::{ConfigError, RemoteConfig};
use crate::mutations::Mutations;
use crate::queries::Queries;
use crate::remote::{HttpRemoteService, RemoteService};
use crate::sync::SyncStore;

/// One client session: a backend connection plus its cache.
///
/// All state is owned here and injected downward; constructing two clients
/// gives two fully independent caches, which is what tests rely on.
/// Cheaply cloneable.
#[derive(Clone)]
pub struct TiffinClient {
    queries: Queries,
    mutations: Mutations,
    store: SyncStore,
}

impl TiffinClient {
    /// Build a client over any backend implementation.
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteService>) -> Self {
        let store = SyncStore::new();
        Self {
            queries: Queries::new(Arc::clone(&remote), store.clone()),
            mutations: Mutations::new(remote, store.clone()),
            store,
        }
    }

    /// Build a client over the HTTP backend configured in the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or
    /// unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = RemoteConfig::from_env()?;
        info!(endpoint = %config.endpoint, "connecting to backend");
        Ok(Self::new(Arc::new(HttpRemoteService::new(&config))))
    }

    /// The read side.
    #[must_use]
    pub const fn queries(&self) -> &Queries {
        &self.queries
    }

    /// The write side.
    #[must_use]
    pub const fn mutations(&self) -> &Mutations {
        &self.mutations
    }

    /// The shared store, for stale reads and invalidation subscriptions.
    #[must_use]
    pub const fn store(&self) -> &SyncStore {
        &self.store
    }

    /// End the session: drop every cached value, fresh and stale.
    ///
    /// Live subscriptions keep running and will refill the cache; callers
    /// are expected to drop them alongside calling this.
    pub fn logout(&self) {
        self.store.clear();
        info!("session ended, caches dropped");
    }
}
