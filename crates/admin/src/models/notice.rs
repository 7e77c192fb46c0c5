//! User-facing notifications attached to sign-in and sign-out outcomes.

use serde::{Deserialize, Serialize};

/// Visual treatment of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeVariant {
    /// The action succeeded.
    Success,
    /// The action failed.
    Destructive,
}

/// A transient notification for the dashboard (or the CLI's stdout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl Notice {
    #[must_use]
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Success,
        }
    }

    #[must_use]
    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NoticeVariant::Destructive,
        }
    }

    /// Notice shown after a successful sign-in.
    #[must_use]
    pub fn signed_in(given_name: &str, family_name: &str) -> Self {
        Self::success("Signed in", format!("Welcome {given_name} {family_name}"))
    }

    /// Notice shown after a sign-out.
    #[must_use]
    pub fn signed_out() -> Self {
        Self::success("Signed out", "You have been signed out.")
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.variant, NoticeVariant::Success)
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}
