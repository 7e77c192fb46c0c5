//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness
//! GET  /health/ready                        - Readiness (backend reachable)
//!
//! # Auth (allow-list + security questions)
//! POST /auth/login                          - Sign in
//! POST /auth/logout                         - Sign out
//! GET  /auth/session                        - Current session and authorization
//!
//! # Clients (authorized admins only)
//! GET  /api/clients                         - List clients
//! POST /api/clients                         - Create client
//! GET  /api/clients/{client_id}             - Get client
//! PUT  /api/clients/{client_id}             - Update client
//! GET  /api/clients/{client_id}/quota       - Get quota
//! PUT  /api/clients/{client_id}/quota       - Update quota
//! GET  /api/clients/{client_id}/preview     - Live preview
//! ```

pub mod auth;
pub mod clients;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the complete router for admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(clients::router())
}
