//! Admin verification and profile lookups.

use tracing::instrument;

use chatbot_admin_core::{Email, SecurityAnswer};

use super::{AdminProfile, BackendClient, BackendError, VerifyAdminParams};

impl BackendClient {
    /// Call the `verify_admin_auth` procedure.
    ///
    /// Answers are sent exactly as typed.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the procedure does not return a boolean.
    #[instrument(skip(self, answer1, answer2), fields(email = %email))]
    pub async fn verify_admin(
        &self,
        email: &Email,
        answer1: &SecurityAnswer,
        answer2: &SecurityAnswer,
    ) -> Result<bool, BackendError> {
        let url = self.supabase_endpoint("/rest/v1/rpc/verify_admin_auth")?;
        let params = VerifyAdminParams {
            p_email: email.as_str(),
            p_question_1: answer1.expose(),
            p_question_2: answer2.expose(),
        };
        self.post(url, &params).await
    }

    /// Fetch the profile row for `email`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if no row matches, or another error if
    /// the request fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn admin_profile(&self, email: &Email) -> Result<AdminProfile, BackendError> {
        let url = self.supabase_endpoint("/rest/v1/admin_authenticated")?;
        let query = [
            ("email", format!("eq.{}", email.as_str())),
            ("select", "*".to_string()),
        ];
        self.get_single(url, &query).await
    }
}
