//! REST API adapters.
//!
//! Route layout:
//!
//! ```text
//! POST   /api/auth/register          public
//! POST   /api/auth/login             public
//! GET    /api/auth/me
//! GET    /api/workspaces             POST creates (owner + general channel)
//! GET    /api/workspaces/:id         403 for non-members
//! GET    /api/workspaces/:id/members
//! GET    /api/workspaces/:id/channels   POST creates (name slugified)
//! GET    /api/channels/:id/messages     POST writes then broadcasts
//! GET    /api/dm/:user_id               POST writes then pushes to receiver
//! GET    /api/users/:id              PATCH /api/users/me updates profile
//! GET    /api/search                 substring search within a workspace
//! GET    /ws                         WebSocket upgrade (?token=)
//! ```

mod auth;
mod channels;
mod dms;
mod error;
mod messages;
mod middleware;
mod state;
mod users;
mod workspaces;

pub use error::ApiError;
pub use middleware::{auth_middleware, RequireAuth};
pub use state::AppState;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::adapters::realtime::ws_upgrade;

/// Builds the full application router. CORS and timeouts are layered on
/// by the binary, where the configuration lives.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route(
            "/api/workspaces",
            get(workspaces::list).post(workspaces::create),
        )
        .route("/api/workspaces/:id", get(workspaces::get))
        .route("/api/workspaces/:id/members", get(workspaces::members))
        .route(
            "/api/workspaces/:id/channels",
            get(channels::list).post(channels::create),
        )
        .route(
            "/api/channels/:id/messages",
            get(messages::list).post(messages::create),
        )
        .route("/api/dm/:user_id", get(dms::list).post(dms::create))
        .route("/api/users/me", patch(users::update_me))
        .route("/api/users/:id", get(users::get))
        .route("/api/search", get(messages::search))
        .route("/ws", get(ws_upgrade))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
