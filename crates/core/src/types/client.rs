//! Chatbot client configuration types.
//!
//! Client records are owned by the remote client-configuration API; these
//! types are the shape the dashboard reads and writes.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::ClientStatus;

/// Errors that can occur when parsing a [`ClientId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientIdError {
    /// The input is empty once trimmed.
    #[error("client id cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("client id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[a-z0-9_-]`.
    #[error("client id may only contain lowercase letters, digits, '-' and '_' (found {0:?})")]
    InvalidCharacter(char),
}

/// Identifier of a chatbot client.
///
/// The uniqueness key used for list rendering and edit targeting.
///
/// ```
/// use chatbot_admin_core::ClientId;
///
/// assert!(ClientId::parse("acme-support").is_ok());
/// assert!(ClientId::parse("Acme Support").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    /// Maximum length of a client id.
    pub const MAX_LENGTH: usize = 64;

    /// Parse a client id, trimming surrounding whitespace first.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`ClientId::MAX_LENGTH`], or contains characters outside `[a-z0-9_-]`.
    pub fn parse(s: &str) -> Result<Self, ClientIdError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ClientIdError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(ClientIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(bad) = s
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
        {
            return Err(ClientIdError::InvalidCharacter(bad));
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ClientId {
    type Err = ClientIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Message quota of a chatbot client for the current period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientQuota {
    /// Client the quota belongs to.
    pub client_id: ClientId,
    /// Messages allowed per period.
    pub message_limit: u64,
    /// Messages consumed in the current period.
    #[serde(default)]
    pub messages_used: u64,
    /// Start of the current period, if the backend tracks it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_start: Option<DateTime<Utc>>,
}

impl ClientQuota {
    /// Messages left in the current period.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.message_limit.saturating_sub(self.messages_used)
    }

    /// Whether the client has used its whole allowance.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.messages_used >= self.message_limit
    }

    /// Share of the allowance consumed, as a percentage capped at 100.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Message counts stay far below f64 precision
    pub fn usage_percent(&self) -> f64 {
        if self.message_limit == 0 {
            return 100.0;
        }
        let pct = self.messages_used as f64 / self.message_limit as f64 * 100.0;
        pct.min(100.0)
    }
}

/// A chatbot client configuration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Uniqueness key.
    pub client_id: ClientId,
    /// Whether the bot answers traffic.
    pub is_active: bool,
    /// Free-text description shown in the dashboard.
    #[serde(default)]
    pub bot_description: String,
    /// Endpoint the bot forwards conversations to.
    pub webhook_url: String,
    /// Quota state, when the API embeds it in the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<ClientQuota>,
}

impl ClientConfig {
    /// Dashboard status derived from the activity flag and quota.
    ///
    /// `quota` overrides the embedded quota when supplied.
    #[must_use]
    pub fn status_with(&self, quota: Option<&ClientQuota>) -> ClientStatus {
        if !self.is_active {
            return ClientStatus::Inactive;
        }
        match quota.or(self.quota.as_ref()) {
            Some(q) if q.is_exhausted() => ClientStatus::QuotaExhausted,
            _ => ClientStatus::Active,
        }
    }

    /// Dashboard status using the embedded quota only.
    #[must_use]
    pub fn status(&self) -> ClientStatus {
        self.status_with(None)
    }
}
