//! Authentication route handlers for admin.
//!
//! Sign-in takes an email and the answers to two security questions. Every
//! outcome carries a [`Notice`] for the dashboard.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use chatbot_admin_core::CredentialAttempt;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAdminSession, TowerSessionSlot};
use crate::models::{Notice, SessionView};
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(session_status))
}

/// Successful sign-in response.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub session: SessionView,
    pub notice: Notice,
}

/// Sign-out response.
#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub notice: Notice,
}

/// Current session summary.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session: Option<SessionView>,
    pub authorized: bool,
}

/// Sign in.
///
/// POST /auth/login
async fn login(
    State(state): State<AppState>,
    slot: TowerSessionSlot,
    Json(attempt): Json<CredentialAttempt>,
) -> Result<Json<LoginResponse>, AppError> {
    let signed_in = state.auth().sign_in(&slot, attempt).await?;

    set_sentry_user(
        &signed_in.session.id,
        Some(signed_in.session.email.as_str()),
    );

    Ok(Json(LoginResponse {
        session: SessionView::from(&signed_in.session),
        notice: signed_in.notice,
    }))
}

/// Sign out and clear the session.
///
/// POST /auth/logout
async fn logout(
    State(state): State<AppState>,
    slot: TowerSessionSlot,
) -> Result<Json<LogoutResponse>, AppError> {
    let notice = state.auth().sign_out(&slot).await?;
    clear_sentry_user();
    Ok(Json(LogoutResponse { notice }))
}

/// Report the stored session and whether it passes the authorization check.
///
/// GET /auth/session
async fn session_status(
    State(state): State<AppState>,
    OptionalAdminSession(admin): OptionalAdminSession,
) -> Json<SessionStatus> {
    let authorized = state.auth().is_authorized(admin.as_ref()).await;
    Json(SessionStatus {
        session: admin.as_ref().map(SessionView::from),
        authorized,
    })
}
