//! Authentication types for the domain layer.
//!
//! A `Principal` is the identity extracted from a validated bearer token.
//! It is populated by the `SessionValidator` port, so any token scheme can
//! back it. The same type is used for HTTP requests (Authorization header)
//! and WebSocket handshakes (query parameter).

use thiserror::Error;

use super::UserId;

/// Authenticated identity extracted from a validated token.
#[derive(Debug, Clone)]
pub struct Principal {
    /// The unique user identifier.
    pub user_id: UserId,

    /// Email address from the token claims.
    pub email: String,

    /// Display name from the token claims.
    pub display_name: String,
}

impl Principal {
    /// Creates a new principal.
    pub fn new(user_id: UserId, email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            display_name: display_name.into(),
        }
    }
}

/// Authentication errors surfaced during token validation.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid token")]
    InvalidToken,

    /// The token was valid once but has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The validation backend could not be reached or failed internally.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Returns true if the client should obtain a fresh token.
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, AuthError::InvalidToken | AuthError::TokenExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_and_invalid_tokens_require_reauthentication() {
        assert!(AuthError::InvalidToken.requires_reauthentication());
        assert!(AuthError::TokenExpired.requires_reauthentication());
        assert!(!AuthError::ServiceUnavailable("down".into()).requires_reauthentication());
    }
}
