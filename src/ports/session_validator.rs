//! Session validation port - the principal resolver.
//!
//! Verifies a bearer credential and yields a stable user identity. Used
//! identically by the HTTP auth middleware (Authorization header) and the
//! WebSocket upgrade handler (query parameter, since browser WebSocket
//! clients cannot set custom headers).

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, Principal};

/// Validates bearer tokens and resolves them to a [`Principal`].
///
/// # Contract
///
/// Implementations must:
/// - Return the principal for a well-formed, unexpired, correctly signed
///   token
/// - Return `AuthError::TokenExpired` for expired tokens
/// - Return `AuthError::InvalidToken` for anything else malformed
/// - Have no side effects
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Validate a bearer token and resolve the principal it identifies.
    async fn validate(&self, token: &str) -> Result<Principal, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;
    use std::collections::HashMap;
    use std::sync::RwLock;

    struct TableValidator {
        tokens: RwLock<HashMap<String, Principal>>,
    }

    #[async_trait]
    impl SessionValidator for TableValidator {
        async fn validate(&self, token: &str) -> Result<Principal, AuthError> {
            self.tokens
                .read()
                .unwrap()
                .get(token)
                .cloned()
                .ok_or(AuthError::InvalidToken)
        }
    }

    #[tokio::test]
    async fn validator_resolves_known_token() {
        let principal = Principal::new(UserId::new(), "a@example.com", "Alice");
        let validator = TableValidator {
            tokens: RwLock::new(HashMap::from([("tok".to_string(), principal.clone())])),
        };

        let resolved = validator.validate("tok").await.unwrap();
        assert_eq!(resolved.user_id, principal.user_id);
    }

    #[tokio::test]
    async fn validator_rejects_unknown_token() {
        let validator = TableValidator {
            tokens: RwLock::new(HashMap::new()),
        };
        assert!(matches!(
            validator.validate("nope").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn validator_trait_is_object_safe_and_send_sync() {
        fn _assert_arc_send_sync<T: Send + Sync + ?Sized>() {}
        _assert_arc_send_sync::<std::sync::Arc<dyn SessionValidator>>();
    }
}
