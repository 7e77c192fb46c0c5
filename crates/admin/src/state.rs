//! Application state shared across handlers.

use std::sync::Arc;

use tower_sessions::MemoryStore;

use crate::backend::{BackendClient, BackendError};
use crate::config::AdminConfig;
use crate::middleware::SignOutLedger;
use crate::services::{AuthService, ClientService};

/// Application state shared across all handlers.
///
/// Cheap to clone; all clones share the same inner state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    backend: BackendClient,
    auth: AuthService<BackendClient>,
    sessions: MemoryStore,
    sign_outs: SignOutLedger,
}

impl AppState {
    /// Build the state, creating the backend client from `config`.
    ///
    /// # Errors
    ///
    /// Returns error if the backend client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, BackendError> {
        let backend = BackendClient::new(&config.backend)?;
        let auth = AuthService::new(backend.clone(), &config.auth);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                auth,
                sessions: MemoryStore::default(),
                sign_outs: SignOutLedger::default(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService<BackendClient> {
        &self.inner.auth
    }

    #[must_use]
    pub fn clients(&self) -> ClientService<'_> {
        ClientService::new(&self.inner.backend)
    }

    /// Server-side session records, keyed by cookie.
    #[must_use]
    pub fn session_store(&self) -> &MemoryStore {
        &self.inner.sessions
    }

    /// Sign-out generations of every browser session.
    #[must_use]
    pub fn sign_outs(&self) -> &SignOutLedger {
        &self.inner.sign_outs
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("backend", &self.inner.backend)
            .finish_non_exhaustive()
    }
}
