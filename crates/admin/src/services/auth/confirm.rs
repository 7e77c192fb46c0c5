//! Remote confirmation step.
//!
//! First the verification procedure says whether the credentials are valid,
//! then the admin profile is fetched. Each step runs under its own deadline
//! and is attempted exactly once.

use std::future::Future;
use std::time::Duration;

use tracing::instrument;

use chatbot_admin_core::{Email, SecurityAnswer};

use super::AuthError;
use crate::backend::{AdminProfile, BackendClient, BackendError};

/// Remote procedure that checks an email and two answers.
pub trait VerificationBackend: Send + Sync {
    fn verify_admin(
        &self,
        email: &Email,
        answer1: &SecurityAnswer,
        answer2: &SecurityAnswer,
    ) -> impl Future<Output = Result<bool, BackendError>> + Send;
}

/// Remote store of admin profiles.
pub trait ProfileStore: Send + Sync {
    fn admin_profile(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<AdminProfile, BackendError>> + Send;
}

impl VerificationBackend for BackendClient {
    async fn verify_admin(
        &self,
        email: &Email,
        answer1: &SecurityAnswer,
        answer2: &SecurityAnswer,
    ) -> Result<bool, BackendError> {
        Self::verify_admin(self, email, answer1, answer2).await
    }
}

impl ProfileStore for BackendClient {
    async fn admin_profile(&self, email: &Email) -> Result<AdminProfile, BackendError> {
        Self::admin_profile(self, email).await
    }
}

/// Runs both confirmation steps against a backend.
#[derive(Debug, Clone)]
pub struct RemoteConfirmation<B> {
    backend: B,
    deadline: Duration,
}

impl<B> RemoteConfirmation<B>
where
    B: VerificationBackend + ProfileStore,
{
    #[must_use]
    pub const fn new(backend: B, deadline: Duration) -> Self {
        Self { backend, deadline }
    }

    /// Ask the verification procedure.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Technical` if the call fails or exceeds the deadline.
    #[instrument(skip(self, answer1, answer2), fields(email = %email))]
    pub async fn verify(
        &self,
        email: &Email,
        answer1: &SecurityAnswer,
        answer2: &SecurityAnswer,
    ) -> Result<bool, AuthError> {
        let call = self.backend.verify_admin(email, answer1, answer2);
        match tokio::time::timeout(self.deadline, call).await {
            Ok(Ok(valid)) => Ok(valid),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Admin verification failed");
                Err(AuthError::Technical(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(deadline = ?self.deadline, "Admin verification timed out");
                Err(AuthError::Technical(BackendError::Timeout.to_string()))
            }
        }
    }

    /// Verify, then fetch the profile.
    ///
    /// # Errors
    ///
    /// - `AuthError::Technical` if verification fails or times out
    /// - `AuthError::InvalidCredentials` if verification answers `false`
    /// - `AuthError::ProfileUnavailable` if the profile fetch fails, times out or finds nothing
    #[instrument(skip(self, answer1, answer2), fields(email = %email))]
    pub async fn confirm(
        &self,
        email: &Email,
        answer1: &SecurityAnswer,
        answer2: &SecurityAnswer,
    ) -> Result<AdminProfile, AuthError> {
        if !self.verify(email, answer1, answer2).await? {
            return Err(AuthError::InvalidCredentials);
        }

        match tokio::time::timeout(self.deadline, self.backend.admin_profile(email)).await {
            Ok(Ok(profile)) => Ok(profile),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Admin profile lookup failed");
                Err(AuthError::ProfileUnavailable(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(deadline = ?self.deadline, "Admin profile lookup timed out");
                Err(AuthError::ProfileUnavailable(
                    BackendError::Timeout.to_string(),
                ))
            }
        }
    }
}
