//! Direct message endpoints.
//!
//! A sent DM is pushed to the receiver's connections only. The sender's
//! other tabs catch up from history on focus, matching the channel
//! message rule that the acting user is never echoed.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::adapters::realtime::{BroadcastTarget, DmEvent, ServerEvent};
use crate::domain::chat::DirectMessage;
use crate::domain::foundation::UserId;

use super::error::ApiError;
use super::middleware::RequireAuth;
use super::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendDmRequest {
    pub content: String,
}

/// GET /api/dm/:user_id
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(other): Path<UserId>,
) -> Result<Json<Vec<DirectMessage>>, ApiError> {
    Ok(Json(
        state
            .store
            .direct_messages_between(principal.user_id, other)
            .await?,
    ))
}

/// POST /api/dm/:user_id
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(receiver_id): Path<UserId>,
    Json(req): Json<SendDmRequest>,
) -> Result<(StatusCode, Json<DirectMessage>), ApiError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(ApiError::BadRequest("Message content is required".into()));
    }

    let receiver = state
        .store
        .get_user(receiver_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    let message = state
        .store
        .create_direct_message(principal.user_id, receiver_id, content)
        .await?;

    if let Ok(Some(sender)) = state.store.get_user(principal.user_id).await {
        let event = ServerEvent::DmNew(DmEvent {
            message: message.clone(),
            sender,
            receiver,
        });
        state
            .hub
            .broadcast(BroadcastTarget::User(receiver_id), &event, None)
            .await;
    }

    Ok((StatusCode::CREATED, Json(message)))
}
