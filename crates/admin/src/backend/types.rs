//! Wire types for the remote backend.

use serde::{Deserialize, Serialize};

use chatbot_admin_core::{AdminId, Email};

/// A row of the `admin_authenticated` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: AdminId,
    pub email: Email,
    #[serde(rename = "prenom")]
    pub given_name: String,
    #[serde(rename = "nom")]
    pub family_name: String,
}

/// Parameters of the `verify_admin_auth` procedure.
#[derive(Debug, Serialize)]
pub(crate) struct VerifyAdminParams<'a> {
    pub p_email: &'a str,
    pub p_question_1: &'a str,
    pub p_question_2: &'a str,
}

/// Body of a quota update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaUpdate {
    /// New per-period message allowance.
    pub message_limit: u64,
    /// Zero the period's usage counter.
    #[serde(default)]
    pub reset_usage: bool,
}
