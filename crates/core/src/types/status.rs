//! Status enums for admins and chatbot clients.

use serde::{Deserialize, Serialize};

/// Admin role stored in a session.
///
/// Sessions store the role as a free string; only the `admin` value grants
/// access without re-verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Full access to client configuration management.
    Admin,
}

impl AdminRole {
    /// String form used in persisted sessions.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
        }
    }
}

/// Display status of a chatbot client in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    /// Active and within quota.
    Active,
    /// Switched off by an admin.
    Inactive,
    /// Active, but the message quota for the period is used up.
    QuotaExhausted,
}

impl std::fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
            Self::QuotaExhausted => write!(f, "quota_exhausted"),
        }
    }
}
