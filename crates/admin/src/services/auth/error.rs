//! Admin authentication error types.

use thiserror::Error;

use super::gate::{Denial, DenialMode};
use crate::models::Notice;
use crate::services::session::SessionSlotError;

/// Errors that can occur during sign-in.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email is malformed. Never reaches the network.
    #[error("{0}")]
    Validation(&'static str),

    /// The allow-list rejected the attempt. Never reaches the network.
    #[error("{0}")]
    NotAuthorized(&'static str),

    /// The verification procedure answered `false`.
    #[error("email or security answers incorrect")]
    InvalidCredentials,

    /// The verification procedure could not be reached or failed.
    #[error("verification failed: {0}")]
    Technical(String),

    /// The admin profile could not be fetched.
    #[error("admin profile unavailable: {0}")]
    ProfileUnavailable(String),

    /// A sign-out happened while the attempt was in flight.
    #[error("sign-in superseded by a sign-out")]
    Superseded,

    /// The session slot failed.
    #[error("session storage failed: {0}")]
    Storage(#[from] SessionSlotError),
}

impl AuthError {
    /// Map a gate denial, worded under `mode`.
    #[must_use]
    pub const fn from_denial(denial: Denial, mode: DenialMode) -> Self {
        if denial.is_validation() {
            Self::Validation(denial.message(mode))
        } else {
            Self::NotAuthorized(denial.message(mode))
        }
    }

    /// Stable machine-readable kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotAuthorized(_) => "not_authorized",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Technical(_) => "technical",
            Self::ProfileUnavailable(_) => "profile_unavailable",
            Self::Superseded => "superseded",
            Self::Storage(_) => "storage",
        }
    }

    /// Notice shown to the user. Carries no internal details.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::Validation(reason) | Self::NotAuthorized(reason) => {
                Notice::destructive("Access denied", *reason)
            }
            Self::InvalidCredentials => {
                Notice::destructive("Access denied", "Email or security answers incorrect")
            }
            Self::Technical(_) => {
                Notice::destructive("Sign-in error", "Technical error during verification")
            }
            Self::ProfileUnavailable(_) => {
                Notice::destructive("Error", "Unable to retrieve admin information")
            }
            Self::Superseded => {
                Notice::destructive("Sign-in error", "Sign-in cancelled by a sign-out")
            }
            Self::Storage(_) => Notice::destructive("Sign-in error", "An unexpected error occurred"),
        }
    }

    /// Whether the failure is on our side or a remote's rather than the caller's.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Technical(_) | Self::ProfileUnavailable(_) | Self::Storage(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_denial() {
        let err = AuthError::from_denial(Denial::InvalidEmailFormat, DenialMode::Generic);
        assert_eq!(err.kind(), "validation");
        assert_eq!(err.to_string(), "invalid email format");

        let err = AuthError::from_denial(Denial::Answer1Incorrect, DenialMode::Detailed);
        assert_eq!(err.kind(), "not_authorized");
        assert_eq!(err.to_string(), "answer 1 incorrect");

        let err = AuthError::from_denial(Denial::Answer1Incorrect, DenialMode::Generic);
        assert_eq!(err.to_string(), "access denied");
    }

    #[test]
    fn test_notice_hides_details() {
        let err = AuthError::Technical("connection refused at 10.0.0.3".to_string());
        let notice = err.notice();
        assert!(!notice.is_success());
        assert!(!notice.description.contains("10.0.0.3"));
        assert!(err.is_server_error());
        assert!(!AuthError::InvalidCredentials.is_server_error());
    }
}
