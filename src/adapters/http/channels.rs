//! Channel endpoints, nested under a workspace.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::domain::chat::{slugify_channel_name, Channel};
use crate::domain::foundation::WorkspaceId;
use crate::ports::NewChannel;

use super::error::ApiError;
use super::middleware::RequireAuth;
use super::state::AppState;
use super::workspaces::require_member;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
}

/// GET /api/workspaces/:id/channels
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(workspace_id): Path<WorkspaceId>,
) -> Result<Json<Vec<Channel>>, ApiError> {
    require_member(&state, workspace_id, principal.user_id).await?;
    Ok(Json(state.store.channels_for_workspace(workspace_id).await?))
}

/// POST /api/workspaces/:id/channels
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(workspace_id): Path<WorkspaceId>,
    Json(req): Json<CreateChannelRequest>,
) -> Result<(StatusCode, Json<Channel>), ApiError> {
    require_member(&state, workspace_id, principal.user_id).await?;

    let name = slugify_channel_name(&req.name);
    if name.is_empty() {
        return Err(ApiError::BadRequest("Channel name is required".into()));
    }

    let channel = state
        .store
        .create_channel(NewChannel {
            workspace_id,
            name,
            description: req.description,
            is_private: req.is_private,
            created_by: principal.user_id,
        })
        .await?;

    tracing::info!(channel = %channel.id, workspace = %workspace_id, "channel created");
    Ok((StatusCode::CREATED, Json(channel)))
}
