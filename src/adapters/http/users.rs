//! User profile endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::domain::chat::User;
use crate::domain::foundation::UserId;
use crate::ports::UserUpdate;

use super::error::ApiError;
use super::middleware::RequireAuth;
use super::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub status_message: Option<String>,
}

/// GET /api/users/:id
pub async fn get(
    State(state): State<AppState>,
    RequireAuth(_principal): RequireAuth,
    Path(id): Path<UserId>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .store
        .get_user(id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(user))
}

/// PATCH /api/users/me
pub async fn update_me(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    if let Some(name) = &req.name {
        if name.trim().len() < 2 {
            return Err(ApiError::BadRequest(
                "Name must be at least 2 characters".into(),
            ));
        }
    }

    let user = state
        .store
        .update_user(
            principal.user_id,
            UserUpdate {
                name: req.name.map(|n| n.trim().to_string()),
                avatar: req.avatar,
                status_message: req.status_message,
            },
        )
        .await?;
    Ok(Json(user))
}
