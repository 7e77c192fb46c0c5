//! Session middleware configuration for admin.
//!
//! Sessions live server-side in a `tower-sessions` memory store; the browser
//! only holds an opaque `SameSite=Strict`, `HttpOnly` cookie.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tokio::sync::Mutex;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};
use uuid::Uuid;

use crate::config::AdminConfig;
use crate::error::AppError;
use crate::models::session_keys;
use crate::services::session::{SessionSlot, SessionSlotError};
use crate::state::AppState;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "chatbot_admin_session";

/// Session expiry time in seconds (24 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer over `store`.
///
/// Cookies are marked `Secure` when the admin is served over HTTPS.
#[must_use]
pub fn create_session_layer(
    config: &AdminConfig,
    store: MemoryStore,
) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}

#[derive(Debug, Clone, Copy)]
struct LedgerEntry {
    generation: u64,
    touched: Instant,
}

/// Sign-out generations, shared by every request of the process.
///
/// Each request loads its own copy of the session record, so a counter kept
/// inside the record would not be seen by a concurrent sign-in. Entries
/// expire after the session inactivity window, like the records they track.
#[derive(Debug, Clone)]
pub struct SignOutLedger {
    generations: Arc<Mutex<HashMap<Uuid, LedgerEntry>>>,
    ttl: Duration,
}

impl Default for SignOutLedger {
    fn default() -> Self {
        Self::with_ttl(Duration::from_secs(SESSION_EXPIRY_SECONDS.unsigned_abs()))
    }
}

impl SignOutLedger {
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            generations: Arc::default(),
            ttl,
        }
    }

    async fn get(&self, slot_id: Uuid) -> u64 {
        self.generations
            .lock()
            .await
            .get(&slot_id)
            .filter(|entry| entry.touched.elapsed() < self.ttl)
            .map_or(0, |entry| entry.generation)
    }

    async fn bump(&self, slot_id: Uuid) -> u64 {
        let mut generations = self.generations.lock().await;
        generations.retain(|_, entry| entry.touched.elapsed() < self.ttl);

        let entry = generations.entry(slot_id).or_insert(LedgerEntry {
            generation: 0,
            touched: Instant::now(),
        });
        entry.generation += 1;
        entry.touched = Instant::now();
        entry.generation
    }
}

/// Session slot backed by the request's `tower-sessions` record.
#[derive(Debug, Clone)]
pub struct TowerSessionSlot {
    session: Session,
    ledger: SignOutLedger,
}

impl TowerSessionSlot {
    #[must_use]
    pub const fn new(session: Session, ledger: SignOutLedger) -> Self {
        Self { session, ledger }
    }

    /// Ledger id of this browser session, if one was ever assigned.
    ///
    /// Read-only: an anonymous session stays unsaved.
    async fn existing_slot_id(&self) -> Result<Option<Uuid>, SessionSlotError> {
        Ok(self.session.get::<Uuid>(session_keys::SLOT_ID).await?)
    }

    /// Ledger id of this browser session, assigned on first use.
    async fn slot_id(&self) -> Result<Uuid, SessionSlotError> {
        if let Some(id) = self.existing_slot_id().await? {
            return Ok(id);
        }
        let id = Uuid::new_v4();
        self.session.insert(session_keys::SLOT_ID, id).await?;
        Ok(id)
    }
}

impl SessionSlot for TowerSessionSlot {
    async fn read(&self) -> Result<Option<String>, SessionSlotError> {
        Ok(self.session.get::<String>(session_keys::ADMIN_USER).await?)
    }

    async fn write(&self, raw: &str) -> Result<(), SessionSlotError> {
        // New identity, new session id
        self.session.cycle_id().await?;
        self.session.insert(session_keys::ADMIN_USER, raw).await?;
        Ok(())
    }

    async fn remove(&self) -> Result<(), SessionSlotError> {
        self.session
            .remove::<String>(session_keys::ADMIN_USER)
            .await?;
        Ok(())
    }

    async fn generation(&self) -> Result<u64, SessionSlotError> {
        let slot_id = self.slot_id().await?;
        Ok(self.ledger.get(slot_id).await)
    }

    async fn bump_generation(&self) -> Result<u64, SessionSlotError> {
        // No sign-in ever ran here, so there is nothing to supersede
        let Some(slot_id) = self.existing_slot_id().await? else {
            return Ok(0);
        };
        Ok(self.ledger.bump(slot_id).await)
    }
}

impl FromRequestParts<AppState> for TowerSessionSlot {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_string()))?;

        Ok(Self::new(session, state.sign_outs().clone()))
    }
}
