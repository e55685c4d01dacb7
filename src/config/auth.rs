//! Authentication configuration

use serde::Deserialize;

use super::error::ValidationError;

/// JWT and password hashing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens
    pub jwt_secret: String,

    /// Token lifetime in hours (default: 7 days)
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,

    /// bcrypt work factor for password hashing
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    /// Validate authentication configuration.
    ///
    /// Secret strength is only enforced in production so local
    /// development can use a throwaway value.
    pub fn validate(&self, is_production: bool) -> Result<(), ValidationError> {
        if is_production && self.jwt_secret.len() < 32 {
            return Err(ValidationError::WeakJwtSecret);
        }
        if self.token_ttl_hours == 0 || self.token_ttl_hours > 24 * 30 {
            return Err(ValidationError::InvalidTokenTtl);
        }
        if !(4..=16).contains(&self.bcrypt_cost) {
            return Err(ValidationError::InvalidBcryptCost);
        }
        Ok(())
    }
}

fn default_token_ttl_hours() -> u64 {
    24 * 7
}

fn default_bcrypt_cost() -> u32 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_secret_allowed_outside_production() {
        let config = AuthConfig {
            jwt_secret: "dev".into(),
            token_ttl_hours: default_token_ttl_hours(),
            bcrypt_cost: default_bcrypt_cost(),
        };
        assert!(config.validate(false).is_ok());
        assert!(config.validate(true).is_err());
    }

    #[test]
    fn zero_ttl_is_rejected() {
        let config = AuthConfig {
            jwt_secret: "a-test-secret-of-sufficient-length".into(),
            token_ttl_hours: 0,
            bcrypt_cost: 10,
        };
        assert!(matches!(
            config.validate(false),
            Err(ValidationError::InvalidTokenTtl)
        ));
    }
}
