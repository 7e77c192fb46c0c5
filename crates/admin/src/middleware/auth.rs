//! Authentication extractors for admin.
//!
//! Provides extractors for requiring an authorized admin in route handlers.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};

use super::session::TowerSessionSlot;
use crate::error::{AppError, set_sentry_user};
use crate::models::AdminSession;
use crate::state::AppState;

/// Extractor that requires an authorized admin.
///
/// Re-runs the authorization check on every request: the `admin` role is
/// trusted, otherwise the cached answers are replayed remotely.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.given_name)
/// }
/// ```
pub struct RequireAdminAuth(pub AdminSession);

/// Error returned when an authorized admin is required.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// No session.
    Unauthorized,
    /// A session exists but the authorization check failed.
    Forbidden,
    /// The session could not be read.
    Session(AppError),
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => AppError::Unauthorized("Not signed in".to_string()),
            Self::Forbidden => AppError::Forbidden("Admin rights required".to_string()),
            Self::Session(err) => err,
        }
        .into_response()
    }
}

impl FromRequestParts<AppState> for RequireAdminAuth {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let slot = TowerSessionSlot::from_request_parts(parts, state)
            .await
            .map_err(AdminAuthRejection::Session)?;

        let admin = state
            .auth()
            .restore(&slot)
            .await
            .map_err(|e| AdminAuthRejection::Session(e.into()))?
            .ok_or(AdminAuthRejection::Unauthorized)?;

        if !state.auth().is_authorized(Some(&admin)).await {
            tracing::info!(email = %admin.email, "Admin failed authorization check");
            return Err(AdminAuthRejection::Forbidden);
        }

        set_sentry_user(&admin.id, Some(admin.email.as_str()));
        Ok(Self(admin))
    }
}

/// Extractor that optionally gets the stored admin session.
///
/// Unlike `RequireAdminAuth`, this neither rejects nor runs the
/// authorization check.
pub struct OptionalAdminSession(pub Option<AdminSession>);

impl FromRequestParts<AppState> for OptionalAdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let slot = TowerSessionSlot::from_request_parts(parts, state).await?;
        let admin = state.auth().restore(&slot).await?;
        Ok(Self(admin))
    }
}
