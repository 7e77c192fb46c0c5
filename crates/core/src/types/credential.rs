//! Security-question credential types.
//!
//! A sign-in attempt carries an email and the answers to two security
//! questions. Answers are kept verbatim (as typed) because the session
//! replays them against the remote verification procedure, but they are
//! wrapped so they never show up in `Debug` output or logs.

use core::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Normalize a security answer for comparison: trim, then lower-case.
#[must_use]
pub fn normalize_answer(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// The raw answer to a security question.
///
/// Serializes as a plain string so a stored session deserializes and
/// re-serializes to identical bytes. `Debug` is redacted.
#[derive(Clone)]
pub struct SecurityAnswer(SecretString);

impl SecurityAnswer {
    /// Wrap a raw answer exactly as typed.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(SecretString::from(raw.into()))
    }

    /// The answer exactly as typed.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// The answer trimmed and lower-cased.
    #[must_use]
    pub fn normalized(&self) -> String {
        normalize_answer(self.expose())
    }

    /// Whether nothing was typed. Whitespace counts as an answer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

impl fmt::Debug for SecurityAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecurityAnswer([REDACTED])")
    }
}

impl PartialEq for SecurityAnswer {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for SecurityAnswer {}

impl From<&str> for SecurityAnswer {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for SecurityAnswer {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl Serialize for SecurityAnswer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

impl<'de> Deserialize<'de> for SecurityAnswer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

/// An ephemeral sign-in attempt.
///
/// Exists only for the duration of a sign-in; never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CredentialAttempt {
    /// Email exactly as typed (normalized by the gate).
    pub email: String,
    /// Answer to "name of a dog".
    pub answer1: SecurityAnswer,
    /// Answer to "name of a mutual best friend".
    pub answer2: SecurityAnswer,
}

impl CredentialAttempt {
    /// Build an attempt from raw strings.
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        answer1: impl Into<String>,
        answer2: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            answer1: SecurityAnswer::new(answer1),
            answer2: SecurityAnswer::new(answer2),
        }
    }
}
