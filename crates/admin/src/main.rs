//! Chatbot Admin - administration backend for chatbot client configurations.
//!
//! Serves the admin JSON API (port 3001 by default): security-question
//! sign-in, session status, and client configuration management.
//!
//! # Architecture
//!
//! - Axum web framework, JSON API consumed by the dashboard
//! - Server-side sessions (tower-sessions memory store)
//! - Supabase REST for admin verification and profiles
//! - Client-configuration API for clients and quotas

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use secrecy::ExposeSecret;
use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatbot_admin::config::{AdminConfig, TlsConfig};
use chatbot_admin::state::AppState;

/// Time allowed for in-flight requests once shutdown starts.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = AdminConfig::from_env().expect("Failed to load configuration");

    // Sentry before tracing so the tracing layer reports to a live client
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);

    tracing::debug!(?config, "Configuration loaded");

    let state = AppState::new(config.clone()).expect("Failed to create application state");
    let app = chatbot_admin::app(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    match &config.tls {
        Some(tls) => serve_tls(app, addr, tls).await,
        None => serve(app, addr).await,
    }
}

/// Start Sentry when a DSN is configured. Keep the guard alive.
fn init_sentry(config: &AdminConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;

    let options = sentry::ClientOptions {
        release: sentry::release_name!(),
        environment: config.sentry_environment.clone().map(Into::into),
        sample_rate: config.sentry_sample_rate,
        traces_sample_rate: config.sentry_traces_sample_rate,
        attach_stacktrace: true,
        send_default_pii: false,
        ..Default::default()
    };
    let guard = sentry::init((dsn, options));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Text or JSON logs, filtered by `RUST_LOG`, plus Sentry events.
fn init_tracing(config: &AdminConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "chatbot_admin=info,tower_http=debug".into());

    let json = config
        .log_json
        .then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text = (!config.log_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json)
        .with(text)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// Warnings and errors become Sentry events; info and debug only breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => EventFilter::Breadcrumb,
        tracing::Level::TRACE => EventFilter::Ignore,
    }
}

async fn serve(app: Router, addr: SocketAddr) {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");
    tracing::info!("admin listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn serve_tls(app: Router, addr: SocketAddr, tls: &TlsConfig) {
    let rustls_config = RustlsConfig::from_pem(
        tls.cert_pem.as_bytes().to_vec(),
        tls.key_pem.expose_secret().as_bytes().to_vec(),
    )
    .await
    .expect("Failed to load TLS certificates");
    tracing::info!("admin listening on https://{addr}");

    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
    });

    axum_server::bind_rustls(addr, rustls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .expect("Server error");
}

/// Resolve on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
