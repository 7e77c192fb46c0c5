//! Session-related types for admin authentication.
//!
//! The signed-in admin is persisted as one flat JSON record under
//! [`keys::ADMIN_USER`], whatever slot backs it (server-side session,
//! file, memory).

use serde::{Deserialize, Serialize};

use chatbot_admin_core::{AdminId, AdminRole, Email, SecurityAnswer};

use crate::backend::AdminProfile;

/// Session-stored admin identity.
///
/// Records written by [`AdminSession::to_json`] decode and re-encode to
/// identical bytes: optional fields are omitted when absent rather than
/// written as `null`. Other writers are only read leniently; an explicit
/// `null` or an unknown key decodes fine but is not written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    /// Admin's profile row id.
    pub id: AdminId,
    /// Admin's email address.
    pub email: Email,
    pub given_name: String,
    pub family_name: String,
    /// Role string; `"admin"` grants access without re-verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Answer to question 1, as typed at sign-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer1: Option<SecurityAnswer>,
    /// Answer to question 2, as typed at sign-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer2: Option<SecurityAnswer>,
}

impl AdminSession {
    /// Build the session written after a confirmed sign-in.
    ///
    /// Identity comes from the fetched profile row, email included.
    #[must_use]
    pub fn signed_in(
        profile: AdminProfile,
        answer1: SecurityAnswer,
        answer2: SecurityAnswer,
    ) -> Self {
        Self {
            id: profile.id,
            email: profile.email,
            given_name: profile.given_name,
            family_name: profile.family_name,
            role: Some(AdminRole::Admin.as_str().to_string()),
            answer1: Some(answer1),
            answer2: Some(answer2),
        }
    }

    /// Whether the stored role is exactly `"admin"`.
    #[must_use]
    pub fn has_admin_role(&self) -> bool {
        self.role.as_deref() == Some(AdminRole::Admin.as_str())
    }

    /// Both cached answers, if present and non-empty.
    #[must_use]
    pub fn cached_answers(&self) -> Option<(&SecurityAnswer, &SecurityAnswer)> {
        match (&self.answer1, &self.answer2) {
            (Some(a1), Some(a2)) if !a1.is_empty() && !a2.is_empty() => Some((a1, a2)),
            _ => None,
        }
    }

    /// Encode for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode stored content.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not a valid session record.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Public view of a session. Never carries the cached answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: AdminId,
    pub email: Email,
    pub given_name: String,
    pub family_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl From<&AdminSession> for SessionView {
    fn from(session: &AdminSession) -> Self {
        Self {
            id: session.id,
            email: session.email.clone(),
            given_name: session.given_name.clone(),
            family_name: session.family_name.clone(),
            role: session.role.clone(),
        }
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the signed-in admin.
    pub const ADMIN_USER: &str = "admin_user";

    /// Key for the id that ties a browser session to its sign-out generation.
    pub const SLOT_ID: &str = "slot_id";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session() -> AdminSession {
        AdminSession::signed_in(
            AdminProfile {
                id: AdminId::new(uuid::Uuid::nil()),
                email: Email::parse("silvacorreiaruben@gmail.com").unwrap(),
                given_name: "Ruben".to_string(),
                family_name: "Silva Correia".to_string(),
            },
            SecurityAnswer::new("UNICO"),
            SecurityAnswer::new("Mathys"),
        )
    }

    #[test]
    fn test_roundtrip_is_byte_identical() {
        let stored = session().to_json().unwrap();
        let again = AdminSession::from_json(&stored).unwrap().to_json().unwrap();
        assert_eq!(stored, again);
    }

    #[test]
    fn test_roundtrip_without_optional_fields() {
        let stored = r#"{"id":"00000000-0000-0000-0000-000000000000","email":"a@b.co","given_name":"A","family_name":"B"}"#;
        let parsed = AdminSession::from_json(stored).unwrap();
        assert!(parsed.role.is_none());
        assert!(parsed.answer1.is_none());
        assert_eq!(parsed.to_json().unwrap(), stored);
    }

    #[test]
    fn test_email_taken_from_profile() {
        let profile = AdminProfile {
            id: AdminId::new(uuid::Uuid::nil()),
            email: Email::parse("Ruben.Silva@Example.com").unwrap(),
            given_name: "Ruben".to_string(),
            family_name: "Silva".to_string(),
        };
        let s = AdminSession::signed_in(
            profile,
            SecurityAnswer::new("a"),
            SecurityAnswer::new("b"),
        );
        assert_eq!(s.email.as_str(), "Ruben.Silva@Example.com");
    }

    #[test]
    fn test_foreign_records_are_canonicalized() {
        let foreign = r#"{"id":"00000000-0000-0000-0000-000000000000","email":"a@b.co","given_name":"A","family_name":"B","role":null,"theme":"dark"}"#;
        let parsed = AdminSession::from_json(foreign).unwrap();
        assert!(parsed.role.is_none());
        assert_eq!(
            parsed.to_json().unwrap(),
            r#"{"id":"00000000-0000-0000-0000-000000000000","email":"a@b.co","given_name":"A","family_name":"B"}"#
        );
    }

    #[test]
    fn test_answers_kept_verbatim() {
        let s = session();
        assert!(s.has_admin_role());
        let (a1, a2) = s.cached_answers().unwrap();
        assert_eq!(a1.expose(), "UNICO");
        assert_eq!(a2.expose(), "Mathys");
    }

    #[test]
    fn test_empty_answers_are_not_cached() {
        let mut s = session();
        // Whitespace still counts and gets replayed
        s.answer2 = Some(SecurityAnswer::new("  "));
        assert!(s.cached_answers().is_some());
        s.answer2 = Some(SecurityAnswer::new(""));
        assert!(s.cached_answers().is_none());
        s.answer2 = None;
        assert!(s.cached_answers().is_none());
    }

    #[test]
    fn test_role_must_match_exactly() {
        let mut s = session();
        s.role = Some("Admin".to_string());
        assert!(!s.has_admin_role());
        s.role = None;
        assert!(!s.has_admin_role());
    }

    #[test]
    fn test_view_omits_answers() {
        let json = serde_json::to_string(&SessionView::from(&session())).unwrap();
        assert!(json.contains("Ruben"));
        assert!(!json.contains("UNICO"));
        assert!(!json.contains("Mathys"));
    }

    #[test]
    fn test_corrupt_content_fails_to_decode() {
        assert!(AdminSession::from_json("{not json").is_err());
        assert!(AdminSession::from_json(r#"{"email":"a@b.co"}"#).is_err());
    }
}
