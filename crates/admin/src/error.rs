//! Unified error handling for admin.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use chatbot_admin_core::AdminId;

use crate::backend::BackendError;
use crate::models::Notice;
use crate::services::auth::AuthError;
use crate::services::clients::{ClientError, ClientInputError};
use crate::services::session::SessionSlotError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Sign-in or sign-out failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Remote backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Session slot failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionSlotError),

    /// Dashboard input rejected.
    #[error("Invalid input: {0}")]
    Input(#[from] ClientInputError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User lacks permission.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Input(e) => Self::Input(e),
            ClientError::NotFound(id) => Self::NotFound(format!("client {id}")),
            ClientError::Backend(e) => Self::Backend(e),
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notice: Option<Notice>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Auth(err) => match err {
                AuthError::Validation(_) => StatusCode::BAD_REQUEST,
                AuthError::NotAuthorized(_) | AuthError::InvalidCredentials => {
                    StatusCode::FORBIDDEN
                }
                AuthError::Technical(_) | AuthError::ProfileUnavailable(_) => {
                    StatusCode::BAD_GATEWAY
                }
                AuthError::Superseded => StatusCode::CONFLICT,
                AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Session(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Input(_) => StatusCode::BAD_REQUEST,
        }
    }

    const fn is_server_error(&self) -> bool {
        match self {
            Self::Auth(err) => err.is_server_error(),
            Self::Backend(_) | Self::Session(_) | Self::Internal(_) => true,
            _ => false,
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Auth(err) => err.kind(),
            Self::Backend(_) => "backend",
            Self::Session(_) | Self::Internal(_) => "internal",
            Self::Input(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Auth(err) => err.notice().description,
            Self::Session(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Backend(_) => "External service error".to_string(),
            _ => self.to_string(),
        };

        let notice = match &self {
            Self::Auth(err) => Some(err.notice()),
            _ => None,
        };

        let body = ErrorBody {
            error: self.kind(),
            message,
            notice,
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Set the Sentry user context from an admin id.
pub fn set_sentry_user(admin_id: &AdminId, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
