//! Allow-list gate.
//!
//! First stage of every sign-in. Pure and offline: checks the email shape,
//! then the allow-listed email, then both security answers, stopping at the
//! first failure.

use std::collections::BTreeSet;

use chatbot_admin_core::{CredentialAttempt, Email, SecurityAnswer, normalize_answer};

/// Emails accepted when no override is configured.
const BUILTIN_EMAILS: &[&str] = &["silvacorreiaruben@gmail.com", "lamperim.diego47@gmail.com"];

/// Accepted answers to "name of a dog" when no override is configured.
const BUILTIN_ANSWER1: &[&str] = &["unico", "bons"];

/// Accepted answer to "name of a mutual best friend" when no override is configured.
const BUILTIN_ANSWER2: &str = "mathys";

/// Message shown for every allow-list denial in [`DenialMode::Generic`].
pub const GENERIC_DENIAL: &str = "access denied";

/// How allow-list denials are worded to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DenialMode {
    /// Tell the caller which check failed.
    #[default]
    Detailed,
    /// Collapse allow-list failures into [`GENERIC_DENIAL`].
    ///
    /// Email format errors keep their own message.
    Generic,
}

/// Which gate check rejected an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// The email is not shaped like `local@domain.tld`.
    InvalidEmailFormat,
    /// The email is not on the allow-list.
    EmailNotAuthorized,
    /// Answer 1 is not an accepted answer.
    Answer1Incorrect,
    /// Answer 2 does not match.
    Answer2Incorrect,
}

impl Denial {
    /// Stable reason string.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::InvalidEmailFormat => "invalid email format",
            Self::EmailNotAuthorized => "email not authorized",
            Self::Answer1Incorrect => "answer 1 incorrect",
            Self::Answer2Incorrect => "answer 2 incorrect",
        }
    }

    /// Reason as worded under `mode`.
    #[must_use]
    pub const fn message(self, mode: DenialMode) -> &'static str {
        match (self, mode) {
            (Self::InvalidEmailFormat, _) | (_, DenialMode::Detailed) => self.reason(),
            (_, DenialMode::Generic) => GENERIC_DENIAL,
        }
    }

    /// Whether the attempt failed on input shape rather than on the allow-list.
    #[must_use]
    pub const fn is_validation(self) -> bool {
        matches!(self, Self::InvalidEmailFormat)
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

/// Outcome of [`AllowListGate::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Every check passed. Carries the normalized email.
    Allowed {
        /// Trimmed, lower-cased email.
        email: Email,
    },
    /// A check failed.
    Denied(Denial),
}

/// Allow-lists the gate checks against.
///
/// Every value is normalized (trimmed, lower-cased) on construction.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    emails: BTreeSet<String>,
    answers1: BTreeSet<String>,
    answer2: String,
}

impl AccessPolicy {
    /// Build a policy from raw values.
    pub fn new<E, A>(
        emails: impl IntoIterator<Item = E>,
        answers1: impl IntoIterator<Item = A>,
        answer2: impl AsRef<str>,
    ) -> Self
    where
        E: AsRef<str>,
        A: AsRef<str>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(|e| e.as_ref().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            answers1: answers1
                .into_iter()
                .map(|a| normalize_answer(a.as_ref()))
                .filter(|a| !a.is_empty())
                .collect(),
            answer2: normalize_answer(answer2.as_ref()),
        }
    }

    /// The built-in policy.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(BUILTIN_EMAILS, BUILTIN_ANSWER1, BUILTIN_ANSWER2)
    }

    /// Allowed emails, normalized.
    pub fn allowed_emails(&self) -> impl Iterator<Item = &str> {
        self.emails.iter().map(String::as_str)
    }

    /// Accepted answers to question 1, normalized.
    pub fn accepted_answer1(&self) -> impl Iterator<Item = &str> {
        self.answers1.iter().map(String::as_str)
    }

    /// Accepted answer to question 2, normalized.
    #[must_use]
    pub fn accepted_answer2(&self) -> &str {
        &self.answer2
    }

    /// Whether `email` is on the allow-list (compared case-insensitively).
    #[must_use]
    pub fn is_email_allowed(&self, email: &str) -> bool {
        self.emails.contains(&email.trim().to_lowercase())
    }

    /// Whether `answer` is an accepted answer to question 1.
    #[must_use]
    pub fn accepts_answer1(&self, answer: &SecurityAnswer) -> bool {
        self.answers1.contains(&answer.normalized())
    }

    /// Whether `answer` matches the accepted answer to question 2.
    #[must_use]
    pub fn accepts_answer2(&self, answer: &SecurityAnswer) -> bool {
        !self.answer2.is_empty() && answer.normalized() == self.answer2
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for AccessPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessPolicy")
            .field("emails", &self.emails)
            .field("answers1", &"[REDACTED]")
            .field("answer2", &"[REDACTED]")
            .finish()
    }
}

/// The allow-list gate.
#[derive(Debug, Clone, Default)]
pub struct AllowListGate {
    policy: AccessPolicy,
}

impl AllowListGate {
    /// Create a gate over `policy`.
    #[must_use]
    pub const fn new(policy: AccessPolicy) -> Self {
        Self { policy }
    }

    /// The policy this gate checks against.
    #[must_use]
    pub const fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Run the checks in order: email shape, allow-listed email, answer 1, answer 2.
    #[must_use]
    pub fn evaluate(&self, attempt: &CredentialAttempt) -> GateDecision {
        let Ok(email) = Email::normalize(&attempt.email) else {
            return GateDecision::Denied(Denial::InvalidEmailFormat);
        };

        if !self.policy.is_email_allowed(email.as_str()) {
            return GateDecision::Denied(Denial::EmailNotAuthorized);
        }

        if !self.policy.accepts_answer1(&attempt.answer1) {
            return GateDecision::Denied(Denial::Answer1Incorrect);
        }

        if !self.policy.accepts_answer2(&attempt.answer2) {
            return GateDecision::Denied(Denial::Answer2Incorrect);
        }

        GateDecision::Allowed { email }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ADMIN: &str = "silvacorreiaruben@gmail.com";

    fn evaluate(email: &str, a1: &str, a2: &str) -> GateDecision {
        AllowListGate::default().evaluate(&CredentialAttempt::new(email, a1, a2))
    }

    #[test]
    fn test_allows_mixed_case_and_padding() {
        let decision = evaluate("  SilvaCorreiaRuben@Gmail.com ", "UNICO", "Mathys");
        assert_eq!(
            decision,
            GateDecision::Allowed {
                email: Email::parse(ADMIN).unwrap()
            }
        );
    }

    #[test]
    fn test_second_admin_and_second_dog() {
        assert!(matches!(
            evaluate("lamperim.diego47@gmail.com", " bons ", "MATHYS"),
            GateDecision::Allowed { .. }
        ));
    }

    #[test]
    fn test_format_failure_precedes_allow_list() {
        for bad in ["", "no-at-sign", "a@b", "a@@b.com", "@x.com", "a@.com", "a@x."] {
            assert_eq!(
                evaluate(bad, "unico", "mathys"),
                GateDecision::Denied(Denial::InvalidEmailFormat),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_spaced_or_long_email_is_well_formed_but_unknown() {
        let long = format!("{}@gmail.com", "a".repeat(260));
        for email in ["silva correiaruben@gmail.com", long.as_str()] {
            assert_eq!(
                evaluate(email, "unico", "mathys"),
                GateDecision::Denied(Denial::EmailNotAuthorized),
                "{email:?}"
            );
        }
    }

    #[test]
    fn test_unknown_email_denied_regardless_of_answers() {
        for (a1, a2) in [("unico", "mathys"), ("wrong", "wrong"), ("", "")] {
            assert_eq!(
                evaluate("random@x.com", a1, a2),
                GateDecision::Denied(Denial::EmailNotAuthorized)
            );
        }
    }

    #[test]
    fn test_answer1_denial_independent_of_answer2() {
        for a2 in ["mathys", "nope", ""] {
            assert_eq!(
                evaluate(ADMIN, "rex", a2),
                GateDecision::Denied(Denial::Answer1Incorrect)
            );
        }
    }

    #[test]
    fn test_answer2_denial_iff_mismatch() {
        assert_eq!(
            evaluate(ADMIN, "unico", "notmathys"),
            GateDecision::Denied(Denial::Answer2Incorrect)
        );
        assert_eq!(
            evaluate(ADMIN, "unico", ""),
            GateDecision::Denied(Denial::Answer2Incorrect)
        );
        assert!(matches!(
            evaluate(ADMIN, "unico", " mathys\t"),
            GateDecision::Allowed { .. }
        ));
    }

    #[test]
    fn test_custom_policy_is_normalized() {
        let gate = AllowListGate::new(AccessPolicy::new(
            [" Ops@Example.COM "],
            ["REX", ""],
            " Luna ",
        ));
        assert!(gate.policy().is_email_allowed("ops@example.com"));
        assert_eq!(gate.policy().accepted_answer1().collect::<Vec<_>>(), ["rex"]);
        assert_eq!(gate.policy().accepted_answer2(), "luna");
        assert!(matches!(
            gate.evaluate(&CredentialAttempt::new("ops@example.com", "rex", "LUNA")),
            GateDecision::Allowed { .. }
        ));
        assert_eq!(
            gate.evaluate(&CredentialAttempt::new(ADMIN, "unico", "mathys")),
            GateDecision::Denied(Denial::EmailNotAuthorized)
        );
    }

    #[test]
    fn test_denial_messages() {
        assert_eq!(Denial::EmailNotAuthorized.message(DenialMode::Detailed), "email not authorized");
        assert_eq!(Denial::Answer2Incorrect.message(DenialMode::Generic), GENERIC_DENIAL);
        assert_eq!(
            Denial::InvalidEmailFormat.message(DenialMode::Generic),
            "invalid email format"
        );
        assert!(Denial::InvalidEmailFormat.is_validation());
        assert!(!Denial::Answer1Incorrect.is_validation());
    }

    #[test]
    fn test_policy_debug_hides_answers() {
        let debug = format!("{:?}", AccessPolicy::builtin());
        assert!(debug.contains("silvacorreiaruben@gmail.com"));
        assert!(!debug.contains("unico"));
        assert!(!debug.contains("mathys"));
    }
}
