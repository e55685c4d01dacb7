//! Mock session validator for tests.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, Principal};
use crate::ports::SessionValidator;

/// Table-driven validator: resolves only the tokens it was told about.
#[derive(Default)]
pub struct MockSessionValidator {
    principals: RwLock<HashMap<String, Principal>>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token as valid for the given principal.
    pub fn insert(&self, token: impl Into<String>, principal: Principal) {
        self.principals
            .write()
            .expect("mock validator lock poisoned")
            .insert(token.into(), principal);
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<Principal, AuthError> {
        self.principals
            .read()
            .expect("mock validator lock poisoned")
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    #[tokio::test]
    async fn registered_token_resolves() {
        let validator = MockSessionValidator::new();
        let principal = Principal::new(UserId::new(), "b@example.com", "Bea");
        validator.insert("tok-1", principal.clone());

        let resolved = validator.validate("tok-1").await.unwrap();
        assert_eq!(resolved.user_id, principal.user_id);
        assert!(validator.validate("tok-2").await.is_err());
    }
}
