//! CLI command implementations.
//!
//! # Environment Variables
//!
//! - `CHATBOT_ADMIN_SESSION_FILE` - Session file (default: `~/.config/chatbot-admin/session.json`)
//! - `SUPABASE_URL`, `SUPABASE_ANON_KEY`, `CLIENT_API_URL` - Remote backend
//! - `ADMIN_ALLOWED_EMAILS`, `ADMIN_ACCEPTED_ANSWER1`, `ADMIN_ACCEPTED_ANSWER2` - Allow-list overrides

pub mod auth;
pub mod clients;

use std::path::PathBuf;

use thiserror::Error;

use chatbot_admin::backend::{BackendClient, BackendError};
use chatbot_admin::config::{AuthConfig, BackendConfig, ConfigError};
use chatbot_admin::models::AdminSession;
use chatbot_admin::services::AuthService;
use chatbot_admin::services::auth::AuthError;
use chatbot_admin::services::clients::ClientError;
use chatbot_admin::services::session::FileSessionSlot;

/// Environment variable overriding the session file location.
const SESSION_FILE_VAR: &str = "CHATBOT_ADMIN_SESSION_FILE";

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("{}", .0.notice())]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Client(#[from] ClientError),

    #[error("Not signed in. Run `cba login` first.")]
    NotSignedIn,

    #[error("Session is not authorized for admin commands")]
    NotAuthorized,

    #[error("Cannot locate a home directory; set {SESSION_FILE_VAR}")]
    NoHomeDirectory,
}

/// Resolve the session file from the environment or the default location.
pub fn session_path() -> Result<PathBuf, CliError> {
    session_path_from(std::env::var_os(SESSION_FILE_VAR).map(PathBuf::from), dirs::home_dir())
}

fn session_path_from(
    explicit: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Result<PathBuf, CliError> {
    if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path);
    }
    home.map(|home| {
        home.join(".config")
            .join("chatbot-admin")
            .join("session.json")
    })
    .ok_or(CliError::NoHomeDirectory)
}

/// Everything a networked command needs.
pub struct Context {
    pub slot: FileSessionSlot,
    pub backend: BackendClient,
    pub auth: AuthService<BackendClient>,
}

impl Context {
    /// Load configuration and open the session file.
    pub fn from_env() -> Result<Self, CliError> {
        let backend = BackendClient::new(&BackendConfig::from_env()?)?;
        let auth = AuthService::new(backend.clone(), &AuthConfig::from_env()?);
        let slot = FileSessionSlot::new(session_path()?);
        tracing::debug!(path = %slot.path().display(), "Using session file");

        Ok(Self {
            slot,
            backend,
            auth,
        })
    }

    /// The stored session, provided it passes the authorization check.
    pub async fn require_admin(&self) -> Result<AdminSession, CliError> {
        let session = self
            .auth
            .restore(&self.slot)
            .await?
            .ok_or(CliError::NotSignedIn)?;

        if !self.auth.is_authorized(Some(&session)).await {
            return Err(CliError::NotAuthorized);
        }
        Ok(session)
    }
}
