//! Authentication middleware and the `RequireAuth` extractor.
//!
//! The middleware validates Bearer tokens through the `SessionValidator`
//! port and injects the resulting [`Principal`] into request extensions.
//! A missing token is not an error at this layer: handlers that need an
//! identity use `RequireAuth`, which rejects with 401 when no principal
//! was injected. This keeps public routes (register, login) on the same
//! router.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::domain::foundation::{AuthError, Principal};

use super::state::AppState;

/// Validates the `Authorization: Bearer <token>` header if present.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(token) = token else {
        // No token: continue unauthenticated; RequireAuth enforces.
        return next.run(request).await;
    };

    match state.validator.validate(token).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(e) => {
            let (status, message) = match &e {
                AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
                AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
                AuthError::ServiceUnavailable(msg) => {
                    tracing::error!(error = %msg, "auth service unavailable");
                    (StatusCode::SERVICE_UNAVAILABLE, "Authentication unavailable")
                }
            };
            (status, Json(serde_json::json!({ "message": message }))).into_response()
        }
    }
}

/// Extractor for handlers that require an authenticated caller.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub Principal);

impl<S> axum::extract::FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            parts
                .extensions
                .get::<Principal>()
                .cloned()
                .map(RequireAuth)
                .ok_or(AuthRejection)
        })
    }
}

/// Rejection for requests with no validated principal.
#[derive(Debug, Clone)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": "Authentication required" })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use axum::extract::FromRequestParts;
    use axum::http::Request;

    fn test_principal() -> Principal {
        Principal::new(UserId::new(), "test@example.com", "Test User")
    }

    #[tokio::test]
    async fn mock_validator_resolves_only_registered_tokens() {
        use crate::adapters::auth::MockSessionValidator;
        use crate::ports::SessionValidator;

        let validator = MockSessionValidator::new();
        validator.insert("valid-token", test_principal());

        assert!(validator.validate("valid-token").await.is_ok());
        assert!(matches!(
            validator.validate("unknown-token").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn require_auth_extracts_principal_from_extensions() {
        let mut request: Request<()> = Request::builder().uri("/test").body(()).unwrap();
        request.extensions_mut().insert(test_principal());
        let (mut parts, _body) = request.into_parts();

        let result = RequireAuth::from_request_parts(&mut parts, &()).await;
        let RequireAuth(principal) = result.unwrap();
        assert_eq!(principal.email, "test@example.com");
    }

    #[tokio::test]
    async fn require_auth_rejects_without_principal() {
        let request: Request<()> = Request::builder().uri("/test").body(()).unwrap();
        let (mut parts, _body) = request.into_parts();

        let result = RequireAuth::from_request_parts(&mut parts, &()).await;
        assert!(result.is_err());
    }

    #[test]
    fn rejection_is_401() {
        assert_eq!(AuthRejection.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn bearer_prefix_is_stripped() {
        assert_eq!("Bearer tok".strip_prefix("Bearer "), Some("tok"));
        assert_eq!("Basic dXNlcg==".strip_prefix("Bearer "), None);
    }
}
