//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_BASE_URL` - Public URL for the admin panel
//! - `SUPABASE_URL` - Base URL of the project hosting the verification RPC and profiles
//! - `SUPABASE_ANON_KEY` - API key sent as `apikey` and bearer token
//! - `CLIENT_API_URL` - Base URL of the client-configuration API
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_REMOTE_TIMEOUT_SECS` - Deadline for every remote call (default: 10)
//! - `ADMIN_GENERIC_DENIALS` - Collapse allow-list denials into one message (default: false)
//! - `ADMIN_ALLOWED_EMAILS` - Comma-separated allow-list of admin emails
//! - `ADMIN_ACCEPTED_ANSWER1` - Comma-separated accepted answers to question 1
//! - `ADMIN_ACCEPTED_ANSWER2` - Accepted answer to question 2
//! - `ADMIN_LOG_JSON` - Emit JSON logs (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! ## Optional (TLS)
//! - `ADMIN_TLS_CERT` - PEM-encoded certificate chain
//! - `ADMIN_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::services::auth::{AccessPolicy, DenialMode};

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;

/// Substrings of sample values, matched case-insensitively.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-", "anon-key", "changeme", "replace", "placeholder", "example", "xxx", "todo",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin panel
    pub base_url: String,
    /// Remote backend endpoints and credentials
    pub backend: BackendConfig,
    /// Sign-in policy
    pub auth: AuthConfig,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Remote backend configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL of the project exposing `rest/v1/rpc/verify_admin_auth`
    /// and the `admin_authenticated` table
    pub supabase_url: Url,
    /// Anon API key
    pub anon_key: SecretString,
    /// Base URL of the client-configuration API (`/api/configs`)
    pub client_api_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("supabase_url", &self.supabase_url.as_str())
            .field("anon_key", &"[REDACTED]")
            .field("client_api_url", &self.client_api_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Sign-in policy configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Allow-lists evaluated by the gate
    pub policy: AccessPolicy,
    /// How allow-list denials are worded
    pub denial_mode: DenialMode,
    /// Deadline for each remote step of sign-in and re-verification
    pub deadline: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            policy: AccessPolicy::builtin(),
            denial_mode: DenialMode::Detailed,
            deadline: Duration::from_secs(DEFAULT_REMOTE_TIMEOUT_SECS),
        }
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("ADMIN_TLS_CERT");
        let key_pem = get_optional_env("ADMIN_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ADMIN_TLS_*".to_string(),
                "Both ADMIN_TLS_CERT and ADMIN_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("ADMIN_BASE_URL")?;

        let backend = BackendConfig::from_env()?;
        let auth = AuthConfig::from_env()?;
        let log_json = parse_bool_env("ADMIN_LOG_JSON")?.unwrap_or(false);
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            host,
            port,
            base_url,
            backend,
            auth,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must be marked `Secure`.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl BackendConfig {
    /// Load the backend section on its own (used by the CLI).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a URL or the API key is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let supabase_url = get_required_url("SUPABASE_URL")?;
        let client_api_url = get_required_url("CLIENT_API_URL")?;

        let anon_key = get_required_env("SUPABASE_ANON_KEY")?;
        if let Err(e) = validate_secret_strength(&anon_key, "SUPABASE_ANON_KEY") {
            tracing::warn!("SUPABASE_ANON_KEY validation warning: {e}");
        }

        Ok(Self {
            supabase_url,
            anon_key: SecretString::from(anon_key),
            client_api_url,
            timeout: remote_timeout()?,
        })
    }
}

impl AuthConfig {
    /// Load the sign-in policy on its own (used by the CLI).
    ///
    /// Unset allow-list variables fall back to the built-in policy.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an override is present but empty, or a
    /// flag/timeout cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let builtin = AccessPolicy::builtin();

        let emails = match get_optional_env("ADMIN_ALLOWED_EMAILS") {
            Some(raw) => split_list("ADMIN_ALLOWED_EMAILS", &raw)?,
            None => builtin.allowed_emails().map(str::to_owned).collect(),
        };
        let answers1 = match get_optional_env("ADMIN_ACCEPTED_ANSWER1") {
            Some(raw) => split_list("ADMIN_ACCEPTED_ANSWER1", &raw)?,
            None => builtin.accepted_answer1().map(str::to_owned).collect(),
        };
        let answer2 = match get_optional_env("ADMIN_ACCEPTED_ANSWER2") {
            Some(raw) if raw.trim().is_empty() => {
                return Err(ConfigError::InvalidEnvVar(
                    "ADMIN_ACCEPTED_ANSWER2".to_string(),
                    "must not be empty".to_string(),
                ));
            }
            Some(raw) => raw,
            None => builtin.accepted_answer2().to_owned(),
        };

        let denial_mode = if parse_bool_env("ADMIN_GENERIC_DENIALS")?.unwrap_or(false) {
            DenialMode::Generic
        } else {
            DenialMode::Detailed
        };

        Ok(Self {
            policy: AccessPolicy::new(emails, answers1, answer2),
            denial_mode,
            deadline: remote_timeout()?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable and parse it as an absolute http(s) URL.
fn get_required_url(key: &str) -> Result<Url, ConfigError> {
    let raw = get_required_env(key)?;
    let url = Url::parse(&raw)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional boolean flag (`true`/`false`/`1`/`0`).
fn parse_bool_env(key: &str) -> Result<Option<bool>, ConfigError> {
    get_optional_env(key)
        .map(|raw| parse_bool(key, &raw))
        .transpose()
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

fn remote_timeout() -> Result<Duration, ConfigError> {
    let secs = get_env_or_default(
        "ADMIN_REMOTE_TIMEOUT_SECS",
        &DEFAULT_REMOTE_TIMEOUT_SECS.to_string(),
    )
    .parse::<u64>()
    .map_err(|e| {
        ConfigError::InvalidEnvVar("ADMIN_REMOTE_TIMEOUT_SECS".to_string(), e.to_string())
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "ADMIN_REMOTE_TIMEOUT_SECS".to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Split a comma-separated list, dropping blank entries.
fn split_list(key: &str, raw: &str) -> Result<Vec<String>, ConfigError> {
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect();
    if items.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must list at least one value".to_string(),
        ));
    }
    Ok(items)
}

/// Bits of entropy per character, over the character distribution of `s`.
fn shannon_entropy(s: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    let mut total = 0_u32;
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let total = f64::from(total);
    counts
        .into_values()
        .map(|n| {
            let p = f64::from(n) / total;
            -p * p.log2()
        })
        .sum()
}

/// Reject keys that look copied from a sample `.env` or are too uniform to
/// be issued credentials.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let insecure = |reason: String| ConfigError::InsecureSecret(var_name.to_string(), reason);

    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
        return Err(insecure(format!("looks like a placeholder ('{pattern}')")));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(insecure(format!(
            "{entropy:.2} bits/char is below {MIN_ENTROPY_BITS_PER_CHAR:.1}"
        )));
    }
    Ok(())
}
