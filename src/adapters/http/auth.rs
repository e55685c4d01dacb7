//! Registration, login, and the current-user endpoint.
//!
//! Bcrypt runs on the blocking pool; the work factor comes from
//! configuration so tests can turn it down.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::chat::User;

use super::error::ApiError;
use super::middleware::RequireAuth;
use super::state::AppState;
use crate::ports::NewUser;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = req.email.trim().to_string();
    let name = req.name.trim().to_string();
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".into()));
    }
    if req.password.len() < 6 {
        return Err(ApiError::BadRequest(
            "Password must be at least 6 characters".into(),
        ));
    }
    if name.len() < 2 {
        return Err(ApiError::BadRequest(
            "Name must be at least 2 characters".into(),
        ));
    }

    let cost = state.bcrypt_cost;
    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|_| ApiError::Internal)?
        .map_err(|_| ApiError::Internal)?;

    let user = state
        .store
        .create_user(NewUser {
            email,
            password_hash,
            name,
        })
        .await?;

    let token = state.tokens.issue(&user)?;
    tracing::info!(user = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// POST /api/auth/login
///
/// Unknown email and wrong password produce the same 401 so the endpoint
/// does not leak which addresses are registered.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    const INVALID: ApiError = ApiError::Unauthorized("Invalid credentials");

    let user = state
        .store
        .get_user_by_email(req.email.trim())
        .await?
        .ok_or(INVALID)?;

    let password = req.password;
    let hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|_| ApiError::Internal)?
        .map_err(|_| ApiError::Internal)?;
    if !valid {
        return Err(INVALID);
    }

    let token = state.tokens.issue(&user)?;
    Ok(Json(AuthResponse { token, user }))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
) -> Result<Json<User>, ApiError> {
    let user = state
        .store
        .get_user(principal.user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(user))
}
