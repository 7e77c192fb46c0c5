//! Client configuration management.
//!
//! Validates dashboard input before anything goes to the remote
//! client-configuration API, and assembles the preview.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use chatbot_admin_core::{ClientConfig, ClientId, ClientIdError, ClientQuota, ClientStatus};

use crate::backend::{BackendClient, BackendError, QuotaUpdate};

/// Maximum length of a bot description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

/// Rejected dashboard input.
#[derive(Debug, Error)]
pub enum ClientInputError {
    #[error("invalid client id: {0}")]
    InvalidId(#[from] ClientIdError),

    #[error("webhook url must be an absolute http(s) url: {0}")]
    InvalidWebhookUrl(String),

    #[error("bot description must be at most {max} characters")]
    DescriptionTooLong { max: usize },

    #[error("message limit must be greater than zero")]
    InvalidMessageLimit,
}

/// Errors from client management.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Input(#[from] ClientInputError),

    #[error("client not found: {0}")]
    NotFound(ClientId),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Body of a client creation request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewClientConfig {
    pub client_id: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub bot_description: String,
    pub webhook_url: String,
}

const fn default_active() -> bool {
    true
}

impl NewClientConfig {
    /// Validate into a record ready to send.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(self) -> Result<ClientConfig, ClientInputError> {
        let client_id = ClientId::parse(&self.client_id)?;
        validate_description(&self.bot_description)?;
        let webhook_url = validate_webhook_url(&self.webhook_url)?;

        Ok(ClientConfig {
            client_id,
            is_active: self.is_active,
            bot_description: self.bot_description,
            webhook_url,
            quota: None,
        })
    }
}

/// Body of a client update request. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientConfigUpdate {
    pub is_active: Option<bool>,
    pub bot_description: Option<String>,
    pub webhook_url: Option<String>,
}

impl ClientConfigUpdate {
    /// Validate the present fields and apply them to `config`.
    ///
    /// `config` is untouched if any field is invalid.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn apply(self, config: &mut ClientConfig) -> Result<(), ClientInputError> {
        if let Some(description) = &self.bot_description {
            validate_description(description)?;
        }
        let webhook_url = self
            .webhook_url
            .as_deref()
            .map(validate_webhook_url)
            .transpose()?;

        if let Some(active) = self.is_active {
            config.is_active = active;
        }
        if let Some(description) = self.bot_description {
            config.bot_description = description;
        }
        if let Some(url) = webhook_url {
            config.webhook_url = url;
        }
        Ok(())
    }
}

fn validate_description(description: &str) -> Result<(), ClientInputError> {
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(ClientInputError::DescriptionTooLong {
            max: MAX_DESCRIPTION_CHARS,
        });
    }
    Ok(())
}

fn validate_webhook_url(raw: &str) -> Result<String, ClientInputError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| ClientInputError::InvalidWebhookUrl(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ClientInputError::InvalidWebhookUrl(format!(
            "unsupported url '{trimmed}'"
        )));
    }
    Ok(trimmed.to_owned())
}

fn validate_quota(update: &QuotaUpdate) -> Result<(), ClientInputError> {
    if update.message_limit == 0 {
        return Err(ClientInputError::InvalidMessageLimit);
    }
    Ok(())
}

/// A client as shown in the dashboard's live preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientPreview {
    pub config: ClientConfig,
    /// Omitted when the quota could not be fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<ClientQuota>,
    pub status: ClientStatus,
}

/// Client management operations over the remote API.
#[derive(Debug, Clone)]
pub struct ClientService<'a> {
    backend: &'a BackendClient,
}

impl<'a> ClientService<'a> {
    #[must_use]
    pub const fn new(backend: &'a BackendClient) -> Self {
        Self { backend }
    }

    /// List every client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Backend` if the API request fails.
    pub async fn list_clients(&self) -> Result<Vec<ClientConfig>, ClientError> {
        Ok(self.backend.list_client_configs().await?)
    }

    /// Fetch one client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Input` for a malformed id, `ClientError::NotFound`
    /// if the API has no such client.
    pub async fn get_client(&self, id: &str) -> Result<ClientConfig, ClientError> {
        let id = ClientId::parse(id).map_err(ClientInputError::from)?;
        self.backend
            .get_client_config(&id)
            .await
            .map_err(|e| not_found_as(e, &id))
    }

    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Input` if validation fails, before any remote call.
    #[instrument(skip(self, input), fields(client_id = %input.client_id))]
    pub async fn create_client(&self, input: NewClientConfig) -> Result<ClientConfig, ClientError> {
        let config = input.validate()?;
        let created = self.backend.create_client_config(&config).await?;
        tracing::info!(client_id = %created.client_id, "Client created");
        Ok(created)
    }

    /// Update a client: fetch, apply the present fields, write back.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Input` if validation fails, `ClientError::NotFound`
    /// if the client does not exist.
    #[instrument(skip(self, update))]
    pub async fn update_client(
        &self,
        id: &str,
        update: ClientConfigUpdate,
    ) -> Result<ClientConfig, ClientError> {
        let mut config = self.get_client(id).await?;
        update.apply(&mut config)?;
        let client_id = config.client_id.clone();
        let updated = self
            .backend
            .put_client_config(&config)
            .await
            .map_err(|e| not_found_as(e, &client_id))?;
        tracing::info!(client_id = %updated.client_id, "Client updated");
        Ok(updated)
    }

    /// Fetch a client's quota.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the client has no quota.
    pub async fn get_quota(&self, id: &str) -> Result<ClientQuota, ClientError> {
        let id = ClientId::parse(id).map_err(ClientInputError::from)?;
        self.backend
            .get_client_quota(&id)
            .await
            .map_err(|e| not_found_as(e, &id))
    }

    /// Update a client's quota.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Input` if the limit is zero, before any remote call.
    #[instrument(skip(self))]
    pub async fn update_quota(
        &self,
        id: &str,
        update: QuotaUpdate,
    ) -> Result<ClientQuota, ClientError> {
        let id = ClientId::parse(id).map_err(ClientInputError::from)?;
        validate_quota(&update)?;
        let quota = self
            .backend
            .put_client_quota(&id, &update)
            .await
            .map_err(|e| not_found_as(e, &id))?;
        tracing::info!(client_id = %id, message_limit = quota.message_limit, "Quota updated");
        Ok(quota)
    }

    /// Configuration, quota and status of one client.
    ///
    /// A failing quota lookup leaves the quota out instead of failing.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if the client does not exist.
    pub async fn preview(&self, id: &str) -> Result<ClientPreview, ClientError> {
        let config = self.get_client(id).await?;
        let quota = match self.backend.get_client_quota(&config.client_id).await {
            Ok(quota) => Some(quota),
            Err(e) => {
                tracing::warn!(client_id = %config.client_id, error = %e, "Quota unavailable for preview");
                config.quota.clone()
            }
        };
        let status = config.status_with(quota.as_ref());
        Ok(ClientPreview {
            config,
            quota,
            status,
        })
    }
}

fn not_found_as(error: BackendError, id: &ClientId) -> ClientError {
    if error.is_not_found() {
        ClientError::NotFound(id.clone())
    } else {
        ClientError::Backend(error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_client(id: &str, url: &str) -> NewClientConfig {
        NewClientConfig {
            client_id: id.to_string(),
            is_active: true,
            bot_description: "Support bot".to_string(),
            webhook_url: url.to_string(),
        }
    }

    fn existing() -> ClientConfig {
        new_client("acme", "https://hooks.example.com/acme")
            .validate()
            .unwrap()
    }

    #[test]
    fn test_new_client_validates() {
        let config = new_client(" acme ", " https://hooks.example.com/a ")
            .validate()
            .unwrap();
        assert_eq!(config.client_id.as_str(), "acme");
        assert_eq!(config.webhook_url, "https://hooks.example.com/a");
    }

    #[test]
    fn test_new_client_rejects_bad_input() {
        assert!(matches!(
            new_client("Acme Co", "https://x.example.com").validate(),
            Err(ClientInputError::InvalidId(_))
        ));
        assert!(matches!(
            new_client("acme", "ftp://x.example.com").validate(),
            Err(ClientInputError::InvalidWebhookUrl(_))
        ));
        assert!(matches!(
            new_client("acme", "/relative/path").validate(),
            Err(ClientInputError::InvalidWebhookUrl(_))
        ));

        let mut long = new_client("acme", "https://x.example.com");
        long.bot_description = "é".repeat(MAX_DESCRIPTION_CHARS + 1);
        assert!(matches!(
            long.validate(),
            Err(ClientInputError::DescriptionTooLong { max: 2000 })
        ));
    }

    #[test]
    fn test_description_limit_counts_characters() {
        let mut input = new_client("acme", "https://x.example.com");
        input.bot_description = "é".repeat(MAX_DESCRIPTION_CHARS);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_new_client_defaults_to_active() {
        let input: NewClientConfig = serde_json::from_str(
            r#"{"client_id":"acme","webhook_url":"https://x.example.com"}"#,
        )
        .unwrap();
        assert!(input.is_active);
        assert_eq!(input.bot_description, "");
    }

    #[test]
    fn test_update_applies_present_fields() {
        let mut config = existing();
        ClientConfigUpdate {
            is_active: Some(false),
            bot_description: None,
            webhook_url: Some("http://localhost:9000/hook".to_string()),
        }
        .apply(&mut config)
        .unwrap();

        assert!(!config.is_active);
        assert_eq!(config.bot_description, "Support bot");
        assert_eq!(config.webhook_url, "http://localhost:9000/hook");
    }

    #[test]
    fn test_invalid_update_leaves_config_untouched() {
        let mut config = existing();
        let result = ClientConfigUpdate {
            is_active: Some(false),
            bot_description: None,
            webhook_url: Some("not a url".to_string()),
        }
        .apply(&mut config);

        assert!(result.is_err());
        assert_eq!(config, existing());
    }

    #[test]
    fn test_quota_limit_must_be_positive() {
        assert!(matches!(
            validate_quota(&QuotaUpdate {
                message_limit: 0,
                reset_usage: false
            }),
            Err(ClientInputError::InvalidMessageLimit)
        ));
        assert!(
            validate_quota(&QuotaUpdate {
                message_limit: 1,
                reset_usage: true
            })
            .is_ok()
        );
    }

    #[test]
    fn test_preview_omits_missing_quota() {
        let preview = ClientPreview {
            status: existing().status(),
            config: existing(),
            quota: None,
        };
        let json = serde_json::to_value(&preview).unwrap();
        assert!(json.get("quota").is_none());
        assert_eq!(json["status"], "active");
    }
}
