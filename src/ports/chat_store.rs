//! Data-access port for users, workspaces, channels and messages.
//!
//! The real-time core consumes this interface read-mostly (membership
//! checks, user lookups); the REST handlers use it for writes. Writes
//! always commit here before any broadcast is attempted, so a crash
//! between write and broadcast can only cause a missed live update, never
//! a phantom message.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::chat::{Channel, DirectMessage, MemberRole, Message, User, Workspace};
use crate::domain::foundation::{ChannelId, UserId, WorkspaceId};

/// Errors surfaced by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The email address is already registered.
    #[error("email already registered")]
    DuplicateEmail,

    /// Backend failure (connection, query, constraint).
    #[error("storage error: {0}")]
    Backend(String),
}

/// Fields required to create a user. The password arrives pre-hashed;
/// the store never sees a plaintext password.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

/// Partial user update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub status_message: Option<String>,
}

/// Fields required to create a channel.
#[derive(Debug, Clone)]
pub struct NewChannel {
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub description: Option<String>,
    pub is_private: bool,
    pub created_by: UserId,
}

/// Persistent storage for the chat application.
///
/// The real-time layer treats this as an opaque collaborator; it relies on
/// `get_channel`, `is_workspace_member`, `workspace_members`, `get_user`
/// and `workspaces_for_user` for gating and presence fan-out.
#[async_trait]
pub trait ChatStore: Send + Sync {
    // ─── Users ───────────────────────────────────────────────────────

    /// Create a user. Fails with `DuplicateEmail` if the address is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Apply a partial profile update and return the updated record.
    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User, StoreError>;

    // ─── Workspaces ──────────────────────────────────────────────────

    async fn create_workspace(&self, name: &str, owner: UserId) -> Result<Workspace, StoreError>;

    async fn get_workspace(&self, id: WorkspaceId) -> Result<Option<Workspace>, StoreError>;

    async fn workspaces_for_user(&self, user: UserId) -> Result<Vec<Workspace>, StoreError>;

    /// Idempotent: adding an existing member is a no-op.
    async fn add_workspace_member(
        &self,
        workspace: WorkspaceId,
        user: UserId,
        role: MemberRole,
    ) -> Result<(), StoreError>;

    async fn workspace_members(&self, workspace: WorkspaceId) -> Result<Vec<User>, StoreError>;

    async fn is_workspace_member(
        &self,
        workspace: WorkspaceId,
        user: UserId,
    ) -> Result<bool, StoreError>;

    // ─── Channels ────────────────────────────────────────────────────

    async fn create_channel(&self, channel: NewChannel) -> Result<Channel, StoreError>;

    async fn get_channel(&self, id: ChannelId) -> Result<Option<Channel>, StoreError>;

    async fn channels_for_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> Result<Vec<Channel>, StoreError>;

    // ─── Messages ────────────────────────────────────────────────────

    async fn create_message(
        &self,
        channel: ChannelId,
        sender: UserId,
        content: &str,
    ) -> Result<Message, StoreError>;

    /// Channel history, oldest first.
    async fn messages_for_channel(&self, channel: ChannelId) -> Result<Vec<Message>, StoreError>;

    /// Case-insensitive substring search across a workspace's messages.
    async fn search_messages(
        &self,
        workspace: WorkspaceId,
        query: &str,
    ) -> Result<Vec<Message>, StoreError>;

    // ─── Direct messages ─────────────────────────────────────────────

    async fn create_direct_message(
        &self,
        sender: UserId,
        receiver: UserId,
        content: &str,
    ) -> Result<DirectMessage, StoreError>;

    /// Conversation between two users, oldest first, regardless of
    /// direction.
    async fn direct_messages_between(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Vec<DirectMessage>, StoreError>;
}
