//! Session slot abstraction.
//!
//! A [`SessionSlot`] holds the raw JSON of one [`AdminSession`] plus a
//! sign-out generation counter. The counter only ever grows; every sign-out
//! bumps it, which lets an in-flight sign-in notice that it was superseded.
//!
//! Implementations:
//! - [`crate::middleware::TowerSessionSlot`] - server-side `tower-sessions` record (HTTP)
//! - [`FileSessionSlot`] - JSON file (CLI)
//! - [`MemorySessionSlot`] - in-process (tests)
//!
//! [`AdminSession`]: crate::models::AdminSession

mod file;
mod memory;

pub use file::FileSessionSlot;
pub use memory::MemorySessionSlot;

use std::future::Future;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a session slot.
#[derive(Debug, Error)]
pub enum SessionSlotError {
    /// I/O error while reading or writing the slot file.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The slot container could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The server-side session store failed.
    #[error("session store error: {0}")]
    Store(#[from] tower_sessions::session::Error),
}

/// Key-value slot holding the signed-in admin.
///
/// Implementations must be thread-safe (`Send + Sync`) for use across async tasks.
pub trait SessionSlot: Send + Sync {
    /// Read the raw stored session, if any.
    fn read(&self) -> impl Future<Output = Result<Option<String>, SessionSlotError>> + Send;

    /// Replace the stored session.
    fn write(&self, raw: &str) -> impl Future<Output = Result<(), SessionSlotError>> + Send;

    /// Remove the stored session. Removing an empty slot is not an error.
    fn remove(&self) -> impl Future<Output = Result<(), SessionSlotError>> + Send;

    /// Current sign-out generation.
    fn generation(&self) -> impl Future<Output = Result<u64, SessionSlotError>> + Send;

    /// Advance the sign-out generation and return the new value.
    ///
    /// A slot that never handed out a generation may skip recording and
    /// return 0, since no sign-in can be in flight against it.
    fn bump_generation(&self) -> impl Future<Output = Result<u64, SessionSlotError>> + Send;
}
