//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a string is not an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email is empty")]
    Empty,
    /// Zero or several `@`.
    #[error("email needs exactly one '@'")]
    AtSymbols,
    #[error("email has nothing before '@'")]
    EmptyLocalPart,
    /// Empty domain, or no dot with text on both sides.
    #[error("email domain must look like domain.tld")]
    InvalidDomain,
}

/// An email address of the `local@domain.tld` shape.
///
/// One `@`, a non-empty local part, and a domain with an interior dot.
/// Nothing stricter: no length cap and no whitespace rule. The allow-list
/// decides who gets in, so `"ad min@example.com"` is well-formed and simply
/// not authorized.
///
/// ```
/// use chatbot_admin_core::Email;
///
/// assert!(Email::parse("user.name+tag@domain.co.uk").is_ok());
/// assert!(Email::parse("user@localhost").is_err());
///
/// let email = Email::normalize("  Admin@Example.COM ").unwrap();
/// assert_eq!(email.as_str(), "admin@example.com");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Parse without any normalization.
    ///
    /// # Errors
    ///
    /// Returns the first rule the input breaks.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.is_empty() {
            return Err(EmailError::Empty);
        }

        let mut parts = s.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(EmailError::AtSymbols);
        };
        if local.is_empty() {
            return Err(EmailError::EmptyLocalPart);
        }
        if !has_interior_dot(domain) {
            return Err(EmailError::InvalidDomain);
        }

        Ok(Self(s.to_owned()))
    }

    /// Trim and lower-case, then [`parse`](Self::parse).
    ///
    /// # Errors
    ///
    /// Same as [`Email::parse`].
    pub fn normalize(s: &str) -> Result<Self, EmailError> {
        Self::parse(&s.trim().to_lowercase())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn has_interior_dot(domain: &str) -> bool {
    domain
        .get(1..domain.len().saturating_sub(1))
        .is_some_and(|inner| inner.contains('.'))
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
