//! Authentication adapters.
//!
//! - [`JwtAuthService`] - HS256 token issue + validation for production
//! - [`MockSessionValidator`] - table-driven validator for tests

mod jwt;
mod mock;

pub use jwt::JwtAuthService;
pub use mock::MockSessionValidator;
