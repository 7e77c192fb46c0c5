//! Integration tests for the chatbot admin.
//!
//! Every test spawns two servers on ephemeral ports:
//!
//! - a [`FakeBackend`] standing in for the Supabase project
//!   (`verify_admin_auth`, `admin_authenticated`) and the
//!   client-configuration API (`/api/configs`)
//! - the real admin router, built from a hand-made [`AdminConfig`]
//!
//! and drives the admin over HTTP with a cookie-keeping `reqwest` client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p chatbot-admin-integration-tests
//! ```

use std::collections::{BTreeMap, HashMap};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use reqwest::Client;
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_sessions::{MemoryStore, Session};
use url::Url;

use chatbot_admin::backend::QuotaUpdate;
use chatbot_admin::config::{AdminConfig, AuthConfig, BackendConfig};
use chatbot_admin::middleware::SESSION_COOKIE_NAME;
use chatbot_admin::models::{AdminSession, session_keys};
use chatbot_admin::state::AppState;
use chatbot_admin_core::{
    AdminId, ClientConfig, ClientId, ClientQuota, Email, SecurityAnswer, normalize_answer,
};

/// The built-in admin.
pub const ADMIN_EMAIL: &str = "silvacorreiaruben@gmail.com";
/// A built-in accepted answer to question 1.
pub const ADMIN_ANSWER1: &str = "UNICO";
/// The built-in accepted answer to question 2.
pub const ADMIN_ANSWER2: &str = "Mathys";

// ============================================================================
// Fake backend
// ============================================================================

/// An admin known to the fake verification procedure.
#[derive(Debug, Clone)]
struct FakeAdmin {
    answer1: String,
    answer2: String,
    profile: Value,
}

#[derive(Debug, Default)]
struct FakeInner {
    admins: Mutex<HashMap<String, FakeAdmin>>,
    clients: Mutex<BTreeMap<String, ClientConfig>>,
    quotas: Mutex<HashMap<String, ClientQuota>>,
    verify_calls: AtomicUsize,
    profile_calls: AtomicUsize,
    verify_delay_ms: AtomicU64,
    verify_down: AtomicBool,
    profiles_down: AtomicBool,
}

/// In-process stand-in for the remote backend.
///
/// Cheap to clone; clones share state, so a test keeps a handle while the
/// server runs.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    inner: Arc<FakeInner>,
}

impl FakeBackend {
    /// Register an admin with the verification procedure and profile table.
    pub async fn add_admin(
        &self,
        email: &str,
        answer1: &str,
        answer2: &str,
        names: (&str, &str),
    ) {
        let admin = FakeAdmin {
            answer1: answer1.to_string(),
            answer2: answer2.to_string(),
            profile: json!({
                "id": uuid::Uuid::new_v4(),
                "email": email,
                "prenom": names.0,
                "nom": names.1,
            }),
        };
        self.inner
            .admins
            .lock()
            .await
            .insert(email.trim().to_lowercase(), admin);
    }

    /// Seed a client and, optionally, its quota.
    pub async fn add_client(&self, config: ClientConfig, quota: Option<ClientQuota>) {
        let id = config.client_id.to_string();
        if let Some(quota) = quota {
            self.inner.quotas.lock().await.insert(id.clone(), quota);
        }
        self.inner.clients.lock().await.insert(id, config);
    }

    pub async fn client(&self, id: &str) -> Option<ClientConfig> {
        self.inner.clients.lock().await.get(id).cloned()
    }

    pub fn verify_calls(&self) -> usize {
        self.inner.verify_calls.load(Ordering::SeqCst)
    }

    pub fn profile_calls(&self) -> usize {
        self.inner.profile_calls.load(Ordering::SeqCst)
    }

    /// Delay every verification answer.
    pub fn set_verify_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.inner.verify_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Make the verification procedure fail with a server error.
    pub fn set_verify_down(&self, down: bool) {
        self.inner.verify_down.store(down, Ordering::SeqCst);
    }

    /// Make profile lookups fail with a server error.
    pub fn set_profiles_down(&self, down: bool) {
        self.inner.profiles_down.store(down, Ordering::SeqCst);
    }

    fn router(self) -> Router {
        Router::new()
            .route("/rest/v1/rpc/verify_admin_auth", post(verify_admin_auth))
            .route("/rest/v1/admin_authenticated", get(admin_authenticated))
            .route("/api/configs", get(list_configs).post(create_config))
            .route("/api/configs/{id}", get(show_config).put(put_config))
            .route("/api/configs/{id}/quota", get(show_quota).put(put_quota))
            .with_state(self)
    }

    /// Serve on an ephemeral port; returns the base URL.
    pub async fn spawn(&self) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Failed to read fake address");
        let app = self.clone().router();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Fake backend stopped");
        });

        Url::parse(&format!("http://{addr}")).expect("Invalid fake backend URL")
    }
}

#[derive(Debug, Deserialize)]
struct VerifyParams {
    p_email: String,
    p_question_1: String,
    p_question_2: String,
}

async fn verify_admin_auth(
    State(fake): State<FakeBackend>,
    Json(params): Json<VerifyParams>,
) -> Response {
    fake.inner.verify_calls.fetch_add(1, Ordering::SeqCst);

    let delay = fake.inner.verify_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    if fake.inner.verify_down.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response();
    }

    let admins = fake.inner.admins.lock().await;
    let valid = admins
        .get(&params.p_email.trim().to_lowercase())
        .is_some_and(|admin| {
            normalize_answer(&admin.answer1) == normalize_answer(&params.p_question_1)
                && normalize_answer(&admin.answer2) == normalize_answer(&params.p_question_2)
        });
    Json(valid).into_response()
}

async fn admin_authenticated(
    State(fake): State<FakeBackend>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    fake.inner.profile_calls.fetch_add(1, Ordering::SeqCst);

    if fake.inner.profiles_down.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response();
    }

    let email = query
        .get("email")
        .and_then(|filter| filter.strip_prefix("eq."))
        .map(str::to_lowercase);

    let admins = fake.inner.admins.lock().await;
    match email.and_then(|email| admins.get(&email)) {
        Some(admin) => Json(admin.profile.clone()).into_response(),
        // Single-object read with zero rows
        None => StatusCode::NOT_ACCEPTABLE.into_response(),
    }
}

async fn list_configs(State(fake): State<FakeBackend>) -> Json<Vec<ClientConfig>> {
    Json(fake.inner.clients.lock().await.values().cloned().collect())
}

async fn create_config(
    State(fake): State<FakeBackend>,
    Json(config): Json<ClientConfig>,
) -> Response {
    let mut clients = fake.inner.clients.lock().await;
    let id = config.client_id.to_string();
    if clients.contains_key(&id) {
        return (StatusCode::CONFLICT, "client already exists").into_response();
    }
    clients.insert(id, config.clone());
    (StatusCode::CREATED, Json(config)).into_response()
}

async fn show_config(State(fake): State<FakeBackend>, Path(id): Path<String>) -> Response {
    match fake.inner.clients.lock().await.get(&id) {
        Some(config) => Json(config.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn put_config(
    State(fake): State<FakeBackend>,
    Path(id): Path<String>,
    Json(config): Json<ClientConfig>,
) -> Response {
    let mut clients = fake.inner.clients.lock().await;
    match clients.get_mut(&id) {
        Some(existing) => {
            *existing = config.clone();
            Json(config).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn show_quota(State(fake): State<FakeBackend>, Path(id): Path<String>) -> Response {
    match fake.inner.quotas.lock().await.get(&id) {
        Some(quota) => Json(quota.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn put_quota(
    State(fake): State<FakeBackend>,
    Path(id): Path<String>,
    Json(update): Json<QuotaUpdate>,
) -> Response {
    let Ok(client_id) = ClientId::parse(&id) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    if !fake.inner.clients.lock().await.contains_key(&id) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let mut quotas = fake.inner.quotas.lock().await;
    let quota = quotas.entry(id).or_insert(ClientQuota {
        client_id,
        message_limit: update.message_limit,
        messages_used: 0,
        period_start: None,
    });
    quota.message_limit = update.message_limit;
    if update.reset_usage {
        quota.messages_used = 0;
    }
    Json(quota.clone()).into_response()
}

// ============================================================================
// Admin under test
// ============================================================================

/// A running admin server wired to a [`FakeBackend`].
#[derive(Debug)]
pub struct TestApp {
    pub base_url: String,
    pub backend: FakeBackend,
    sessions: MemoryStore,
}

impl TestApp {
    /// Spawn with the built-in policy and the built-in admin registered.
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn, letting the test adjust the configuration first.
    pub async fn spawn_with(configure: impl FnOnce(&mut AdminConfig)) -> Self {
        let backend = FakeBackend::default();
        backend
            .add_admin(
                ADMIN_EMAIL,
                ADMIN_ANSWER1,
                ADMIN_ANSWER2,
                ("Ruben", "Silva Correia"),
            )
            .await;
        let backend_url = backend.spawn().await;

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind admin");
        let addr = listener.local_addr().expect("Failed to read admin address");

        let mut config = test_config(addr, backend_url);
        configure(&mut config);

        let state = AppState::new(config).expect("Failed to build admin state");
        let sessions = state.session_store().clone();
        let app = chatbot_admin::app(state);

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Admin stopped");
        });

        Self {
            base_url: format!("http://{addr}"),
            backend,
            sessions,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sign in as `email`; returns the raw response.
    pub async fn login(
        &self,
        client: &Client,
        email: &str,
        answer1: &str,
        answer2: &str,
    ) -> reqwest::Response {
        client
            .post(self.url("/auth/login"))
            .json(&json!({
                "email": email,
                "answer1": answer1,
                "answer2": answer2,
            }))
            .send()
            .await
            .expect("Failed to send login")
    }

    /// A client already signed in as the built-in admin.
    pub async fn admin_client(&self) -> Client {
        let client = cookie_client();
        let resp = self
            .login(&client, ADMIN_EMAIL, ADMIN_ANSWER1, ADMIN_ANSWER2)
            .await;
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        client
    }

    /// Store `admin` server-side, as an older sign-in might have left it, and
    /// return a client presenting its cookie.
    pub async fn planted_client(&self, admin: &AdminSession) -> Client {
        let raw = admin.to_json().expect("Failed to encode session");
        let session = Session::new(None, Arc::new(self.sessions.clone()), None);
        session
            .insert(session_keys::ADMIN_USER, raw)
            .await
            .expect("Failed to fill session");
        session.save().await.expect("Failed to save session");
        let id = session.id().expect("Saved session has no id");

        let mut headers = HeaderMap::new();
        let cookie = format!("{SESSION_COOKIE_NAME}={id}");
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&cookie).expect("Invalid cookie header"),
        );
        Client::builder()
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// The session summary as seen by `client`.
    pub async fn session_status(&self, client: &Client) -> Value {
        client
            .get(self.url("/auth/session"))
            .send()
            .await
            .expect("Failed to get session")
            .json()
            .await
            .expect("Invalid session body")
    }
}

/// HTTP client that keeps the admin session cookie.
pub fn cookie_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Configuration pointing both remotes at `backend_url`.
pub fn test_config(addr: SocketAddr, backend_url: Url) -> AdminConfig {
    AdminConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: addr.port(),
        base_url: format!("http://{addr}"),
        backend: BackendConfig {
            supabase_url: backend_url.clone(),
            anon_key: SecretString::from("integration-test-anon-key"),
            client_api_url: backend_url,
            timeout: Duration::from_secs(5),
        },
        auth: AuthConfig {
            deadline: Duration::from_secs(2),
            ..AuthConfig::default()
        },
        log_json: false,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
        tls: None,
    }
}

/// A stored built-in admin without a role, holding the given cached answers.
pub fn roleless_admin(answer1: &str, answer2: &str) -> AdminSession {
    AdminSession {
        id: AdminId::new(uuid::Uuid::new_v4()),
        email: Email::parse(ADMIN_EMAIL).expect("Invalid admin email"),
        given_name: "Ruben".to_string(),
        family_name: "Silva Correia".to_string(),
        role: None,
        answer1: Some(SecurityAnswer::new(answer1)),
        answer2: Some(SecurityAnswer::new(answer2)),
    }
}

/// A client record for seeding.
pub fn client_config(id: &str, is_active: bool) -> ClientConfig {
    ClientConfig {
        client_id: ClientId::parse(id).expect("Invalid test client id"),
        is_active,
        bot_description: format!("Support bot for {id}"),
        webhook_url: format!("https://hooks.example.com/{id}"),
        quota: None,
    }
}

/// A quota record for seeding.
pub fn client_quota(id: &str, limit: u64, used: u64) -> ClientQuota {
    ClientQuota {
        client_id: ClientId::parse(id).expect("Invalid test client id"),
        message_limit: limit,
        messages_used: used,
        period_start: None,
    }
}
