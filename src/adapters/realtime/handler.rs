//! WebSocket endpoint: authenticate the handshake, then pump frames
//! between the socket and the hub.
//!
//! Browsers cannot set an Authorization header on a WebSocket request,
//! so the token travels as a `?token=` query parameter. The upgrade is
//! always completed; a missing or invalid token is answered with a
//! policy-violation close frame (1008) on the upgraded socket, because
//! rejecting the HTTP upgrade itself leaves browser clients with an
//! opaque error they cannot distinguish from a network failure.

use std::borrow::Cow;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::adapters::http::AppState;
use crate::domain::foundation::Principal;

use super::events::parse_client_frame;
use super::registry::ConnectionHandle;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// `GET /ws?token=...`
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        let Some(token) = query.token else {
            close_unauthorized(socket, "missing token").await;
            return;
        };
        match state.validator.validate(&token).await {
            Ok(principal) => run_connection(state, socket, principal).await,
            Err(e) => {
                tracing::debug!(error = %e, "websocket auth failed");
                close_unauthorized(socket, "invalid token").await;
            }
        }
    })
}

async fn close_unauthorized(mut socket: WebSocket, reason: &'static str) {
    let frame = CloseFrame {
        code: close_code::POLICY,
        reason: Cow::Borrowed(reason),
    };
    // The client may already be gone; nothing to do about it.
    let _ = socket.send(Message::Close(Some(frame))).await;
}

async fn run_connection(state: AppState, socket: WebSocket, principal: Principal) {
    let (mut sink, mut stream) = socket.split();
    let (handle, mut outbound) = ConnectionHandle::new(principal.user_id);
    let connection_id = handle.id();

    tracing::info!(
        user = %principal.user_id,
        connection = %connection_id,
        "websocket connected"
    );

    // Writer task: drains the hub-facing channel into the socket. The
    // hub only ever touches the channel sender, so a slow socket never
    // blocks a broadcast.
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
    });

    state.hub.connect(handle.clone()).await;

    while let Some(frame) = stream.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(connection = %connection_id, error = %e, "websocket read error");
                break;
            }
        };
        match message {
            Message::Text(text) => match parse_client_frame(&text) {
                Ok(Some(event)) => {
                    state.hub.handle_client_event(&handle, &principal, event).await;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(connection = %connection_id, error = %e, "dropping frame");
                }
            },
            Message::Close(_) => break,
            // Pings are answered by the protocol layer; binary frames
            // are not part of the protocol.
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
        }
    }

    state.hub.disconnect(principal.user_id, connection_id).await;
    writer.abort();

    tracing::info!(
        user = %principal.user_id,
        connection = %connection_id,
        "websocket disconnected"
    );
}
