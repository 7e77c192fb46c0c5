//! File-backed session slot used by the CLI.
//!
//! The file holds a small JSON envelope: the sign-out generation and the raw
//! session string. Writes go to a temp file first, then rename over the target.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use super::{SessionSlot, SessionSlotError};
use crate::models::session_keys;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Envelope {
    #[serde(default)]
    sign_out_generation: u64,
    #[serde(default, rename = "admin_user", skip_serializing_if = "Option::is_none")]
    raw: Option<String>,
}

/// Session slot stored in a JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionSlot {
    path: PathBuf,
}

impl FileSessionSlot {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| session_keys::ADMIN_USER.to_string());
        name.insert(0, '.');
        name.push_str(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> SessionSlotError {
        SessionSlotError::Io {
            path: self.path.clone(),
            source,
        }
    }

    async fn load(&self) -> Result<Envelope, SessionSlotError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Envelope::default()),
            Err(e) => return Err(self.io_error(e)),
        };

        match serde_json::from_str(&content) {
            Ok(envelope) => Ok(envelope),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Discarding unreadable session file");
                Ok(Envelope::default())
            }
        }
    }

    async fn store(&self, envelope: &Envelope) -> Result<(), SessionSlotError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_string_pretty(envelope)?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, json)
            .await
            .map_err(|e| self.io_error(e))?;
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }
}

impl SessionSlot for FileSessionSlot {
    async fn read(&self) -> Result<Option<String>, SessionSlotError> {
        Ok(self.load().await?.raw)
    }

    async fn write(&self, raw: &str) -> Result<(), SessionSlotError> {
        let mut envelope = self.load().await?;
        envelope.raw = Some(raw.to_owned());
        self.store(&envelope).await
    }

    async fn remove(&self) -> Result<(), SessionSlotError> {
        let mut envelope = self.load().await?;
        if envelope.raw.take().is_none() {
            return Ok(());
        }
        self.store(&envelope).await
    }

    async fn generation(&self) -> Result<u64, SessionSlotError> {
        Ok(self.load().await?.sign_out_generation)
    }

    async fn bump_generation(&self) -> Result<u64, SessionSlotError> {
        let mut envelope = self.load().await?;
        envelope.sign_out_generation += 1;
        self.store(&envelope).await?;
        Ok(envelope.sign_out_generation)
    }
}
