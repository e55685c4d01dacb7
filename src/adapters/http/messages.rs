//! Channel message endpoints and workspace search.
//!
//! A posted message is committed to the store before any broadcast is
//! attempted, so a delivery failure can only cost a live update; clients
//! refetch history on reconnect. The poster is excluded from the
//! broadcast because their client already rendered the message from the
//! HTTP response.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::adapters::realtime::{BroadcastTarget, MessageEvent, ServerEvent};
use crate::domain::chat::Message;
use crate::domain::foundation::{ChannelId, WorkspaceId};

use super::error::ApiError;
use super::middleware::RequireAuth;
use super::state::AppState;
use super::workspaces::require_member;

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub workspace_id: WorkspaceId,
    pub q: String,
}

/// GET /api/channels/:id/messages
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(channel_id): Path<ChannelId>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let channel = state
        .store
        .get_channel(channel_id)
        .await?
        .ok_or(ApiError::NotFound("Channel"))?;
    require_member(&state, channel.workspace_id, principal.user_id).await?;
    Ok(Json(state.store.messages_for_channel(channel_id).await?))
}

/// POST /api/channels/:id/messages
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(channel_id): Path<ChannelId>,
    Json(req): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(ApiError::BadRequest("Message content is required".into()));
    }

    let channel = state
        .store
        .get_channel(channel_id)
        .await?
        .ok_or(ApiError::NotFound("Channel"))?;
    require_member(&state, channel.workspace_id, principal.user_id).await?;

    let message = state
        .store
        .create_message(channel_id, principal.user_id, content)
        .await?;

    // The write is durable at this point; the push is best-effort.
    if let Ok(Some(sender)) = state.store.get_user(principal.user_id).await {
        let event = ServerEvent::MessageNew(MessageEvent {
            message: message.clone(),
            sender,
        });
        state
            .hub
            .broadcast(
                BroadcastTarget::Channel(channel_id),
                &event,
                Some(principal.user_id),
            )
            .await;
    }

    Ok((StatusCode::CREATED, Json(message)))
}

/// GET /api/search?workspaceId=...&q=...
pub async fn search(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Message>>, ApiError> {
    require_member(&state, query.workspace_id, principal.user_id).await?;
    let q = query.q.trim();
    if q.is_empty() {
        return Ok(Json(Vec::new()));
    }
    Ok(Json(state.store.search_messages(query.workspace_id, q).await?))
}
