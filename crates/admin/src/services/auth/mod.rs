//! Admin authentication service.
//!
//! Sign-in runs the allow-list gate, then the remote confirmation step, then
//! persists an [`AdminSession`] in a [`SessionSlot`]. Protected screens call
//! [`AuthService::is_authorized`] on every request.

mod confirm;
mod error;
mod gate;

pub use confirm::{ProfileStore, RemoteConfirmation, VerificationBackend};
pub use error::AuthError;
pub use gate::{AccessPolicy, AllowListGate, Denial, DenialMode, GENERIC_DENIAL, GateDecision};

use tracing::instrument;

use chatbot_admin_core::{CredentialAttempt, Email};

use crate::config::AuthConfig;
use crate::models::{AdminSession, Notice};
use crate::services::session::SessionSlot;

/// Outcome of a successful sign-in.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub session: AdminSession,
    pub notice: Notice,
}

/// Admin authentication service.
#[derive(Debug, Clone)]
pub struct AuthService<B> {
    gate: AllowListGate,
    confirmation: RemoteConfirmation<B>,
    denial_mode: DenialMode,
}

impl<B> AuthService<B>
where
    B: VerificationBackend + ProfileStore,
{
    /// Create a new admin authentication service.
    #[must_use]
    pub fn new(backend: B, config: &AuthConfig) -> Self {
        Self {
            gate: AllowListGate::new(config.policy.clone()),
            confirmation: RemoteConfirmation::new(backend, config.deadline),
            denial_mode: config.denial_mode,
        }
    }

    /// Run the gate alone. Offline.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` or `AuthError::NotAuthorized` on denial.
    pub fn check(&self, attempt: &CredentialAttempt) -> Result<Email, AuthError> {
        match self.gate.evaluate(attempt) {
            GateDecision::Allowed { email } => Ok(email),
            GateDecision::Denied(denial) => {
                tracing::info!(reason = denial.reason(), "Sign-in denied by allow-list");
                Err(AuthError::from_denial(denial, self.denial_mode))
            }
        }
    }

    /// Sign in: gate, remote confirmation, then persist the session.
    ///
    /// Nothing is written unless every step succeeds. If the slot's sign-out
    /// generation moves while the remote calls are in flight, the attempt is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns the first failing step as an [`AuthError`].
    #[instrument(skip(self, slot, attempt), fields(email = %attempt.email))]
    pub async fn sign_in(
        &self,
        slot: &impl SessionSlot,
        attempt: CredentialAttempt,
    ) -> Result<SignedIn, AuthError> {
        let email = self.check(&attempt)?;
        let generation = slot.generation().await?;

        let profile = self
            .confirmation
            .confirm(&email, &attempt.answer1, &attempt.answer2)
            .await?;

        if slot.generation().await? != generation {
            tracing::info!("Sign-in superseded by a sign-out");
            return Err(AuthError::Superseded);
        }

        let session = AdminSession::signed_in(profile, attempt.answer1, attempt.answer2);
        let raw = session.to_json().map_err(|e| AuthError::Storage(e.into()))?;
        slot.write(&raw).await?;

        tracing::info!(admin_id = %session.id, "Admin signed in");
        let notice = Notice::signed_in(&session.given_name, &session.family_name);
        Ok(SignedIn { session, notice })
    }

    /// Sign out: drop the stored session and advance the sign-out generation.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the slot fails.
    #[instrument(skip(self, slot))]
    pub async fn sign_out(&self, slot: &impl SessionSlot) -> Result<Notice, AuthError> {
        slot.remove().await?;
        slot.bump_generation().await?;
        tracing::info!("Admin signed out");
        Ok(Notice::signed_out())
    }

    /// Load the stored session.
    ///
    /// Content that does not decode is removed and reported as no session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the slot fails.
    pub async fn restore(
        &self,
        slot: &impl SessionSlot,
    ) -> Result<Option<AdminSession>, AuthError> {
        let Some(raw) = slot.read().await? else {
            return Ok(None);
        };

        match AdminSession::from_json(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding corrupt admin session");
                slot.remove().await?;
                Ok(None)
            }
        }
    }

    /// Whether `session` may reach admin screens.
    ///
    /// `role == "admin"` is trusted as-is. Otherwise the cached answers are
    /// replayed against the verification procedure; any failure denies.
    #[instrument(skip(self, session), fields(email = session.map(|s| s.email.as_str())))]
    pub async fn is_authorized(&self, session: Option<&AdminSession>) -> bool {
        let Some(session) = session else {
            return false;
        };

        if session.has_admin_role() {
            return true;
        }

        let Some((answer1, answer2)) = session.cached_answers() else {
            return false;
        };

        self.confirmation
            .verify(&session.email, answer1, answer2)
            .await
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use chatbot_admin_core::{AdminId, SecurityAnswer};

    use super::*;
    use crate::backend::{AdminProfile, BackendError};
    use crate::services::session::MemorySessionSlot;

    const ADMIN: &str = "silvacorreiaruben@gmail.com";

    #[derive(Debug, Clone, Copy)]
    enum Verify {
        Valid,
        Invalid,
        Fail,
        Hang,
    }

    #[derive(Debug, Clone, Copy)]
    enum Profile {
        Found,
        Missing,
        Hang,
    }

    #[derive(Debug, Clone)]
    struct FakeBackend {
        verify: Verify,
        profile: Profile,
        calls: Arc<AtomicUsize>,
        sign_out_during_verify: Option<MemorySessionSlot>,
    }

    impl FakeBackend {
        fn new(verify: Verify, profile: Profile) -> Self {
            Self {
                verify,
                profile,
                calls: Arc::new(AtomicUsize::new(0)),
                sign_out_during_verify: None,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl VerificationBackend for FakeBackend {
        async fn verify_admin(
            &self,
            _email: &Email,
            _answer1: &SecurityAnswer,
            _answer2: &SecurityAnswer,
        ) -> Result<bool, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(slot) = &self.sign_out_during_verify {
                slot.remove().await.unwrap();
                slot.bump_generation().await.unwrap();
            }
            match self.verify {
                Verify::Valid => Ok(true),
                Verify::Invalid => Ok(false),
                Verify::Fail => Err(BackendError::Api {
                    status: 500,
                    message: "rpc failed".to_string(),
                }),
                Verify::Hang => std::future::pending().await,
            }
        }
    }

    impl ProfileStore for FakeBackend {
        async fn admin_profile(&self, email: &Email) -> Result<AdminProfile, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.profile {
                Profile::Found => Ok(AdminProfile {
                    id: AdminId::new(uuid::Uuid::nil()),
                    email: email.clone(),
                    given_name: "Ruben".to_string(),
                    family_name: "Silva".to_string(),
                }),
                Profile::Missing => Err(BackendError::NotFound("no matching row".to_string())),
                Profile::Hang => std::future::pending().await,
            }
        }
    }

    fn config() -> AuthConfig {
        AuthConfig {
            deadline: Duration::from_millis(50),
            ..AuthConfig::default()
        }
    }

    fn service(backend: &FakeBackend) -> AuthService<FakeBackend> {
        AuthService::new(backend.clone(), &config())
    }

    fn viewer_session(answers: Option<(&str, &str)>) -> AdminSession {
        AdminSession {
            id: AdminId::new(uuid::Uuid::nil()),
            email: Email::parse(ADMIN).unwrap(),
            given_name: "Ruben".to_string(),
            family_name: "Silva".to_string(),
            role: None,
            answer1: answers.map(|(a, _)| SecurityAnswer::new(a)),
            answer2: answers.map(|(_, b)| SecurityAnswer::new(b)),
        }
    }

    #[tokio::test]
    async fn test_sign_in_success_persists_session() {
        let backend = FakeBackend::new(Verify::Valid, Profile::Found);
        let slot = MemorySessionSlot::new();

        let signed_in = service(&backend)
            .sign_in(&slot, CredentialAttempt::new(ADMIN, "UNICO", "Mathys"))
            .await
            .unwrap();

        assert!(signed_in.session.has_admin_role());
        assert_eq!(signed_in.notice, Notice::signed_in("Ruben", "Silva"));
        assert_eq!(backend.calls(), 2);

        let stored = AdminSession::from_json(&slot.snapshot().await.unwrap()).unwrap();
        assert_eq!(stored, signed_in.session);
        assert_eq!(stored.answer1.unwrap().expose(), "UNICO");
    }

    #[tokio::test]
    async fn test_unknown_email_never_reaches_backend() {
        let backend = FakeBackend::new(Verify::Valid, Profile::Found);
        let slot = MemorySessionSlot::new();

        let err = service(&backend)
            .sign_in(&slot, CredentialAttempt::new("random@x.com", "unico", "mathys"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "not_authorized");
        assert_eq!(err.to_string(), "email not authorized");
        assert_eq!(backend.calls(), 0);
        assert!(slot.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_wrong_answer2_never_reaches_backend() {
        let backend = FakeBackend::new(Verify::Valid, Profile::Found);
        let slot = MemorySessionSlot::new();

        let err = service(&backend)
            .sign_in(&slot, CredentialAttempt::new(ADMIN, "unico", "notmathys"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "answer 2 incorrect");
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_email_is_validation() {
        let backend = FakeBackend::new(Verify::Valid, Profile::Found);
        let err = service(&backend)
            .sign_in(&MemorySessionSlot::new(), CredentialAttempt::new("nope", "unico", "mathys"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation("invalid email format")));
    }

    #[tokio::test]
    async fn test_generic_denials() {
        let backend = FakeBackend::new(Verify::Valid, Profile::Found);
        let service = AuthService::new(
            backend,
            &AuthConfig {
                denial_mode: DenialMode::Generic,
                ..config()
            },
        );

        let err = service
            .check(&CredentialAttempt::new("random@x.com", "unico", "mathys"))
            .unwrap_err();
        assert_eq!(err.to_string(), GENERIC_DENIAL);

        let err = service
            .check(&CredentialAttempt::new("random@", "unico", "mathys"))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid email format");
    }

    #[tokio::test]
    async fn test_verification_false_leaves_no_session() {
        let backend = FakeBackend::new(Verify::Invalid, Profile::Found);
        let slot = MemorySessionSlot::new();

        let err = service(&backend)
            .sign_in(&slot, CredentialAttempt::new(ADMIN, "unico", "mathys"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(backend.calls(), 1);
        assert!(slot.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_profile_failure_leaves_no_session() {
        let backend = FakeBackend::new(Verify::Valid, Profile::Missing);
        let slot = MemorySessionSlot::new();

        let err = service(&backend)
            .sign_in(&slot, CredentialAttempt::new(ADMIN, "unico", "mathys"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "profile_unavailable");
        assert!(slot.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_verification_error_is_technical() {
        let backend = FakeBackend::new(Verify::Fail, Profile::Found);
        let err = service(&backend)
            .sign_in(&MemorySessionSlot::new(), CredentialAttempt::new(ADMIN, "unico", "mathys"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "technical");
    }

    #[tokio::test]
    async fn test_hung_remote_calls_hit_the_deadline() {
        let backend = FakeBackend::new(Verify::Hang, Profile::Found);
        let err = service(&backend)
            .sign_in(&MemorySessionSlot::new(), CredentialAttempt::new(ADMIN, "unico", "mathys"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "technical");

        let backend = FakeBackend::new(Verify::Valid, Profile::Hang);
        let slot = MemorySessionSlot::new();
        let err = service(&backend)
            .sign_in(&slot, CredentialAttempt::new(ADMIN, "unico", "mathys"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "profile_unavailable");
        assert!(slot.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_during_sign_in_supersedes_it() {
        let slot = MemorySessionSlot::new();
        let mut backend = FakeBackend::new(Verify::Valid, Profile::Found);
        backend.sign_out_during_verify = Some(slot.clone());

        let err = service(&backend)
            .sign_in(&slot, CredentialAttempt::new(ADMIN, "unico", "mathys"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Superseded));
        assert!(slot.snapshot().await.is_none());
        assert_eq!(slot.generation().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sign_out_clears_and_bumps() {
        let backend = FakeBackend::new(Verify::Valid, Profile::Found);
        let service = service(&backend);
        let slot = MemorySessionSlot::new();

        service
            .sign_in(&slot, CredentialAttempt::new(ADMIN, "unico", "mathys"))
            .await
            .unwrap();
        let notice = service.sign_out(&slot).await.unwrap();

        assert!(notice.is_success());
        assert!(service.restore(&slot).await.unwrap().is_none());
        assert_eq!(slot.generation().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_restore_discards_corrupt_content() {
        let backend = FakeBackend::new(Verify::Valid, Profile::Found);
        let slot = MemorySessionSlot::with_raw("{\"email\":");

        assert!(service(&backend).restore(&slot).await.unwrap().is_none());
        assert!(slot.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_restore_returns_stored_session() {
        let backend = FakeBackend::new(Verify::Valid, Profile::Found);
        let session = viewer_session(Some(("unico", "mathys")));
        let slot = MemorySessionSlot::with_raw(session.to_json().unwrap());

        let restored = service(&backend).restore(&slot).await.unwrap();
        assert_eq!(restored, Some(session));
    }

    #[tokio::test]
    async fn test_admin_role_authorized_without_network() {
        let backend = FakeBackend::new(Verify::Invalid, Profile::Found);
        let mut session = viewer_session(None);
        session.role = Some("admin".to_string());

        assert!(service(&backend).is_authorized(Some(&session)).await);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_fallback_replays_cached_answers() {
        let session = viewer_session(Some(("UNICO", "Mathys")));

        let backend = FakeBackend::new(Verify::Valid, Profile::Found);
        assert!(service(&backend).is_authorized(Some(&session)).await);
        assert_eq!(backend.calls(), 1);

        let backend = FakeBackend::new(Verify::Invalid, Profile::Found);
        assert!(!service(&backend).is_authorized(Some(&session)).await);

        let backend = FakeBackend::new(Verify::Fail, Profile::Found);
        assert!(!service(&backend).is_authorized(Some(&session)).await);
    }

    #[tokio::test]
    async fn test_fallback_needs_session_and_answers() {
        let backend = FakeBackend::new(Verify::Valid, Profile::Found);
        let service = service(&backend);

        assert!(!service.is_authorized(None).await);
        assert!(!service.is_authorized(Some(&viewer_session(None))).await);
        assert!(
            !service
                .is_authorized(Some(&viewer_session(Some(("unico", "")))))
                .await
        );
        assert_eq!(backend.calls(), 0);

        // Whitespace is an answer, so it goes to the verification procedure
        assert!(
            service
                .is_authorized(Some(&viewer_session(Some(("unico", " ")))))
                .await
        );
        assert_eq!(backend.calls(), 1);
    }
}
