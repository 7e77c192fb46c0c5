//! Client configuration route handlers.
//!
//! Every handler requires an authorized admin.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use chatbot_admin_core::{ClientConfig, ClientQuota};

use crate::backend::QuotaUpdate;
use crate::error::AppError;
use crate::middleware::RequireAdminAuth;
use crate::services::clients::{ClientConfigUpdate, ClientPreview, NewClientConfig};
use crate::state::AppState;

/// Build the clients router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/clients", get(list).post(create))
        .route("/api/clients/{client_id}", get(show).put(update))
        .route(
            "/api/clients/{client_id}/quota",
            get(show_quota).put(update_quota),
        )
        .route("/api/clients/{client_id}/preview", get(preview))
}

/// GET /api/clients
async fn list(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<ClientConfig>>, AppError> {
    Ok(Json(state.clients().list_clients().await?))
}

/// POST /api/clients
async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Json(input): Json<NewClientConfig>,
) -> Result<(StatusCode, Json<ClientConfig>), AppError> {
    let created = state.clients().create_client(input).await?;
    tracing::info!(admin = %admin.email, client_id = %created.client_id, "Client created by admin");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/clients/{client_id}
async fn show(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<Json<ClientConfig>, AppError> {
    Ok(Json(state.clients().get_client(&client_id).await?))
}

/// PUT /api/clients/{client_id}
async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    Json(update): Json<ClientConfigUpdate>,
) -> Result<Json<ClientConfig>, AppError> {
    let updated = state.clients().update_client(&client_id, update).await?;
    tracing::info!(admin = %admin.email, client_id = %updated.client_id, "Client updated by admin");
    Ok(Json(updated))
}

/// GET /api/clients/{client_id}/quota
async fn show_quota(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<Json<ClientQuota>, AppError> {
    Ok(Json(state.clients().get_quota(&client_id).await?))
}

/// PUT /api/clients/{client_id}/quota
async fn update_quota(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    Json(update): Json<QuotaUpdate>,
) -> Result<Json<ClientQuota>, AppError> {
    let quota = state.clients().update_quota(&client_id, update).await?;
    tracing::info!(admin = %admin.email, client_id = %quota.client_id, "Quota updated by admin");
    Ok(Json(quota))
}

/// GET /api/clients/{client_id}/preview
async fn preview(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<Json<ClientPreview>, AppError> {
    Ok(Json(state.clients().preview(&client_id).await?))
}
