//! Workspace endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::domain::chat::{MemberRole, User, Workspace};
use crate::domain::foundation::{UserId, WorkspaceId};
use crate::ports::NewChannel;

use super::error::ApiError;
use super::middleware::RequireAuth;
use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
}

/// Rejects callers who are not members of the workspace. Shared by every
/// workspace-scoped endpoint.
pub(super) async fn require_member(
    state: &AppState,
    workspace: WorkspaceId,
    user: UserId,
) -> Result<(), ApiError> {
    if state.store.is_workspace_member(workspace, user).await? {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// GET /api/workspaces
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
) -> Result<Json<Vec<Workspace>>, ApiError> {
    Ok(Json(
        state.store.workspaces_for_user(principal.user_id).await?,
    ))
}

/// POST /api/workspaces
///
/// The creator becomes the owner member and a default `general` channel
/// is created so the workspace is usable immediately.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Json(req): Json<CreateWorkspaceRequest>,
) -> Result<(StatusCode, Json<Workspace>), ApiError> {
    let name = req.name.trim();
    if name.len() < 2 {
        return Err(ApiError::BadRequest(
            "Workspace name must be at least 2 characters".into(),
        ));
    }

    let workspace = state.store.create_workspace(name, principal.user_id).await?;
    state
        .store
        .add_workspace_member(workspace.id, principal.user_id, MemberRole::Owner)
        .await?;
    state
        .store
        .create_channel(NewChannel {
            workspace_id: workspace.id,
            name: "general".into(),
            description: Some("General discussion".into()),
            is_private: false,
            created_by: principal.user_id,
        })
        .await?;

    tracing::info!(workspace = %workspace.id, owner = %principal.user_id, "workspace created");
    Ok((StatusCode::CREATED, Json(workspace)))
}

/// GET /api/workspaces/:id
pub async fn get(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(id): Path<WorkspaceId>,
) -> Result<Json<Workspace>, ApiError> {
    require_member(&state, id, principal.user_id).await?;
    let workspace = state
        .store
        .get_workspace(id)
        .await?
        .ok_or(ApiError::NotFound("Workspace"))?;
    Ok(Json(workspace))
}

/// GET /api/workspaces/:id/members
pub async fn members(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(id): Path<WorkspaceId>,
) -> Result<Json<Vec<User>>, ApiError> {
    require_member(&state, id, principal.user_id).await?;
    Ok(Json(state.store.workspace_members(id).await?))
}
