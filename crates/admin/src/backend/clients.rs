//! Client configuration and quota operations.

use tracing::instrument;

use chatbot_admin_core::{ClientConfig, ClientId, ClientQuota};

use super::{BackendClient, BackendError, QuotaUpdate};

impl BackendClient {
    /// List every client configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_client_configs(&self) -> Result<Vec<ClientConfig>, BackendError> {
        let url = self.client_api_endpoint("/api/configs")?;
        self.get(url).await
    }

    /// Get a single client configuration.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the client does not exist.
    #[instrument(skip(self), fields(client_id = %id))]
    pub async fn get_client_config(&self, id: &ClientId) -> Result<ClientConfig, BackendError> {
        let url = self.client_api_endpoint(&format!("/api/configs/{id}"))?;
        self.get(url).await
    }

    /// Create a client configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the API rejects the record.
    #[instrument(skip(self, config), fields(client_id = %config.client_id))]
    pub async fn create_client_config(
        &self,
        config: &ClientConfig,
    ) -> Result<ClientConfig, BackendError> {
        let url = self.client_api_endpoint("/api/configs")?;
        self.post(url, config).await
    }

    /// Replace a client configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the client does not exist or the API rejects the record.
    #[instrument(skip(self, config), fields(client_id = %config.client_id))]
    pub async fn put_client_config(
        &self,
        config: &ClientConfig,
    ) -> Result<ClientConfig, BackendError> {
        let url = self.client_api_endpoint(&format!("/api/configs/{}", config.client_id))?;
        self.put(url, config).await
    }

    /// Get a client's quota.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::NotFound` if the client has no quota record.
    #[instrument(skip(self), fields(client_id = %id))]
    pub async fn get_client_quota(&self, id: &ClientId) -> Result<ClientQuota, BackendError> {
        let url = self.client_api_endpoint(&format!("/api/configs/{id}/quota"))?;
        self.get(url).await
    }

    /// Update a client's quota.
    ///
    /// # Errors
    ///
    /// Returns error if the client does not exist or the API rejects the update.
    #[instrument(skip(self), fields(client_id = %id))]
    pub async fn put_client_quota(
        &self,
        id: &ClientId,
        update: &QuotaUpdate,
    ) -> Result<ClientQuota, BackendError> {
        let url = self.client_api_endpoint(&format!("/api/configs/{id}/quota"))?;
        self.put(url, update).await
    }
}
