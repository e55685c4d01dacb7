//! JWT session validator and token issuer.
//!
//! Tokens are HS256-signed and carry the user id, email and display name
//! as claims, so a principal can be resolved without a store round trip.
//! The default lifetime is 7 days; clients are expected to log in again
//! after expiry.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::chat::User;
use crate::domain::foundation::{AuthError, Principal, UserId};
use crate::ports::SessionValidator;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id
    sub: String,
    email: String,
    name: String,
    /// Expiry, seconds since epoch
    exp: i64,
    /// Issued at, seconds since epoch
    iat: i64,
}

/// Issues and validates HS256-signed bearer tokens.
pub struct JwtAuthService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl JwtAuthService {
    /// Create a service signing with the given secret.
    pub fn new(secret: &str, token_ttl_hours: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            token_ttl: Duration::hours(token_ttl_hours as i64),
        }
    }

    /// Issue a token for a user.
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            exp: (now + self.token_ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::ServiceUnavailable(e.to_string()))
    }
}

#[async_trait]
impl SessionValidator for JwtAuthService {
    async fn validate(&self, token: &str) -> Result<Principal, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        let user_id: UserId = data
            .claims
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(Principal::new(user_id, data.claims.email, data.claims.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: UserId::new(),
            email: "alice@example.com".into(),
            password_hash: "hash".into(),
            name: "Alice".into(),
            avatar: None,
            status_message: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn issued_token_validates_to_same_principal() {
        let service = JwtAuthService::new("test-secret", 1);
        let user = test_user();

        let token = service.issue(&user).unwrap();
        let principal = service.validate(&token).await.unwrap();

        assert_eq!(principal.user_id, user.id);
        assert_eq!(principal.email, user.email);
        assert_eq!(principal.display_name, user.name);
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() {
        let service = JwtAuthService::new("test-secret", 1);
        assert!(matches!(
            service.validate("not.a.jwt").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_invalid() {
        let issuer = JwtAuthService::new("secret-a", 1);
        let verifier = JwtAuthService::new("secret-b", 1);

        let token = issuer.issue(&test_user()).unwrap();
        assert!(matches!(
            verifier.validate(&token).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn expired_token_reports_expiry() {
        // Issue a token that expired an hour ago by building claims by hand.
        let secret = "test-secret";
        let now = Utc::now();
        let claims = Claims {
            sub: UserId::new().to_string(),
            email: "a@example.com".into(),
            name: "A".into(),
            exp: (now - Duration::hours(1)).timestamp(),
            iat: (now - Duration::hours(2)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        let service = JwtAuthService::new(secret, 1);
        assert!(matches!(
            service.validate(&token).await,
            Err(AuthError::TokenExpired)
        ));
    }
}
