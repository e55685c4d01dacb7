//! Foundation types shared across the domain: identifiers and
//! authentication primitives.

mod auth;
mod ids;

pub use auth::{AuthError, Principal};
pub use ids::{ChannelId, ConnectionId, DirectMessageId, MessageId, UserId, WorkspaceId};
