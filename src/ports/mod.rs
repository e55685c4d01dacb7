//! Ports: trait seams between the core and its collaborators.
//!
//! - [`SessionValidator`] - token validation (the principal resolver)
//! - [`ChatStore`] - the data-access interface for users, workspaces,
//!   channels and messages

mod chat_store;
mod session_validator;

pub use chat_store::{ChatStore, NewChannel, NewUser, StoreError, UserUpdate};
pub use session_validator::SessionValidator;
