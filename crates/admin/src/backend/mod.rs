//! Remote backend client.
//!
//! Talks to two services:
//!
//! - the Supabase project hosting the `verify_admin_auth` procedure and the
//!   `admin_authenticated` profile table (`/rest/v1/...`)
//! - the client-configuration API (`/api/configs/...`)
//!
//! # API Reference
//!
//! - Authentication: anon key sent as `apikey` and `Authorization: Bearer <key>`
//! - Single-row reads use `Accept: application/vnd.pgrst.object+json`

mod auth;
mod clients;
mod error;
mod types;

pub use error::BackendError;
pub use types::*;

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use url::Url;

use crate::config::BackendConfig;

/// `Accept` value asking PostgREST for exactly one object.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Remote backend client.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    supabase_url: Url,
    client_api_url: Url,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();

        let key = config.anon_key.expose_secret();
        let mut api_key = HeaderValue::from_str(key)
            .map_err(|e| BackendError::Parse(format!("Invalid API key format: {e}")))?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);

        let mut bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| BackendError::Parse(format!("Invalid API key format: {e}")))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                supabase_url: config.supabase_url.clone(),
                client_api_url: config.client_api_url.clone(),
            }),
        })
    }

    /// Check that the client-configuration API answers at all.
    ///
    /// # Errors
    ///
    /// Returns error if the API cannot be reached.
    pub async fn ping(&self) -> Result<(), BackendError> {
        let url = endpoint(&self.inner.client_api_url, "/api/configs")?;
        self.inner.client.head(url).send().await?;
        Ok(())
    }

    fn supabase_endpoint(&self, path: &str) -> Result<Url, BackendError> {
        endpoint(&self.inner.supabase_url, path)
    }

    fn client_api_endpoint(&self, path: &str) -> Result<Url, BackendError> {
        endpoint(&self.inner.client_api_url, path)
    }

    /// Execute a GET request.
    pub(crate) async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<T, BackendError> {
        let response = self.inner.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// Execute a GET request for exactly one PostgREST row.
    pub(crate) async fn get_single<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let response = self
            .inner
            .client
            .get(url)
            .query(query)
            .header(ACCEPT, SINGLE_OBJECT)
            .send()
            .await?;

        // PostgREST answers 406 when a single-object read matches zero rows.
        if response.status().as_u16() == 406 {
            return Err(BackendError::NotFound("no matching row".to_string()));
        }
        self.handle_response(response).await
    }

    /// Execute a POST request.
    pub(crate) async fn post<T: serde::de::DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, BackendError> {
        let response = self.inner.client.post(url).json(body).send().await?;
        self.handle_response(response).await
    }

    /// Execute a PUT request.
    pub(crate) async fn put<T: serde::de::DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, BackendError> {
        let response = self.inner.client.put(url).json(body).send().await?;
        self.handle_response(response).await
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| BackendError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(self.parse_error(response).await)
    }

    /// Parse an error response.
    async fn parse_error(&self, response: reqwest::Response) -> BackendError {
        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return BackendError::Unauthorized;
        }

        if status == 404 {
            return BackendError::NotFound(response.url().path().to_string());
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        BackendError::Api { status, message }
    }
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("supabase_url", &self.inner.supabase_url.as_str())
            .field("client_api_url", &self.inner.client_api_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Append `path` to `base`, keeping any path prefix `base` already has.
fn endpoint(base: &Url, path: &str) -> Result<Url, BackendError> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Ok(Url::parse(&joined)?)
}
