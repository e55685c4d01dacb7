//! PostgreSQL implementation of the `ChatStore` port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::domain::chat::{Channel, DirectMessage, MemberRole, Message, User, Workspace};
use crate::domain::foundation::{
    ChannelId, DirectMessageId, MessageId, UserId, WorkspaceId,
};
use crate::ports::{ChatStore, NewChannel, NewUser, StoreError, UserUpdate};

/// sqlx-backed chat store.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to the configured database and run pending migrations.
    pub async fn connect(config: &DatabaseConfig, url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await
            .map_err(db_error)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool (tests against a prepared database).
    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    name: String,
    avatar: Option<String>,
    status_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_uuid(row.id),
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            avatar: row.avatar,
            status_message: row.status_message,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WorkspaceRow {
    id: Uuid,
    name: String,
    owner_id: Uuid,
    created_at: DateTime<Utc>,
}

impl From<WorkspaceRow> for Workspace {
    fn from(row: WorkspaceRow) -> Self {
        Workspace {
            id: WorkspaceId::from_uuid(row.id),
            name: row.name,
            owner_id: UserId::from_uuid(row.owner_id),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ChannelRow {
    id: Uuid,
    workspace_id: Uuid,
    name: String,
    description: Option<String>,
    is_private: bool,
    created_by: Uuid,
    created_at: DateTime<Utc>,
}

impl From<ChannelRow> for Channel {
    fn from(row: ChannelRow) -> Self {
        Channel {
            id: ChannelId::from_uuid(row.id),
            workspace_id: WorkspaceId::from_uuid(row.workspace_id),
            name: row.name,
            description: row.description,
            is_private: row.is_private,
            created_by: UserId::from_uuid(row.created_by),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    channel_id: Uuid,
    sender_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: MessageId::from_uuid(row.id),
            channel_id: ChannelId::from_uuid(row.channel_id),
            sender_id: UserId::from_uuid(row.sender_id),
            content: row.content,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct DirectMessageRow {
    id: Uuid,
    sender_id: Uuid,
    receiver_id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<DirectMessageRow> for DirectMessage {
    fn from(row: DirectMessageRow) -> Self {
        DirectMessage {
            id: DirectMessageId::from_uuid(row.id),
            sender_id: UserId::from_uuid(row.sender_id),
            receiver_id: UserId::from_uuid(row.receiver_id),
            content: row.content,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl ChatStore for PostgresStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM users WHERE lower(email) = lower($1)")
                .bind(&user.email)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;
        if existing.is_some() {
            return Err(StoreError::DuplicateEmail);
        }

        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (id, email, password_hash, name) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, email, password_hash, name, avatar, status_message, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(row.into())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, password_hash, name, avatar, status_message, created_at \
             FROM users WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, password_hash, name, avatar, status_message, created_at \
             FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(
            "UPDATE users SET \
               name = COALESCE($2, name), \
               avatar = COALESCE($3, avatar), \
               status_message = COALESCE($4, status_message) \
             WHERE id = $1 \
             RETURNING id, email, password_hash, name, avatar, status_message, created_at",
        )
        .bind(id.as_uuid())
        .bind(update.name)
        .bind(update.avatar)
        .bind(update.status_message)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(Into::into).ok_or(StoreError::NotFound("user"))
    }

    async fn create_workspace(&self, name: &str, owner: UserId) -> Result<Workspace, StoreError> {
        let row: WorkspaceRow = sqlx::query_as(
            "INSERT INTO workspaces (id, name, owner_id) VALUES ($1, $2, $3) \
             RETURNING id, name, owner_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(owner.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    async fn get_workspace(&self, id: WorkspaceId) -> Result<Option<Workspace>, StoreError> {
        let row: Option<WorkspaceRow> = sqlx::query_as(
            "SELECT id, name, owner_id, created_at FROM workspaces WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    async fn workspaces_for_user(&self, user: UserId) -> Result<Vec<Workspace>, StoreError> {
        let rows: Vec<WorkspaceRow> = sqlx::query_as(
            "SELECT w.id, w.name, w.owner_id, w.created_at \
             FROM workspaces w \
             JOIN workspace_members m ON m.workspace_id = w.id \
             WHERE m.user_id = $1 \
             ORDER BY w.created_at",
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn add_workspace_member(
        &self,
        workspace: WorkspaceId,
        user: UserId,
        role: MemberRole,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO workspace_members (workspace_id, user_id, role) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (workspace_id, user_id) DO NOTHING",
        )
        .bind(workspace.as_uuid())
        .bind(user.as_uuid())
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn workspace_members(&self, workspace: WorkspaceId) -> Result<Vec<User>, StoreError> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT u.id, u.email, u.password_hash, u.name, u.avatar, u.status_message, \
                    u.created_at \
             FROM users u \
             JOIN workspace_members m ON m.user_id = u.id \
             WHERE m.workspace_id = $1 \
             ORDER BY m.joined_at",
        )
        .bind(workspace.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn is_workspace_member(
        &self,
        workspace: WorkspaceId,
        user: UserId,
    ) -> Result<bool, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1::bigint FROM workspace_members \
             WHERE workspace_id = $1 AND user_id = $2",
        )
        .bind(workspace.as_uuid())
        .bind(user.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.is_some())
    }

    async fn create_channel(&self, channel: NewChannel) -> Result<Channel, StoreError> {
        let row: ChannelRow = sqlx::query_as(
            "INSERT INTO channels (id, workspace_id, name, description, is_private, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id, workspace_id, name, description, is_private, created_by, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(channel.workspace_id.as_uuid())
        .bind(&channel.name)
        .bind(&channel.description)
        .bind(channel.is_private)
        .bind(channel.created_by.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    async fn get_channel(&self, id: ChannelId) -> Result<Option<Channel>, StoreError> {
        let row: Option<ChannelRow> = sqlx::query_as(
            "SELECT id, workspace_id, name, description, is_private, created_by, created_at \
             FROM channels WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.map(Into::into))
    }

    async fn channels_for_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> Result<Vec<Channel>, StoreError> {
        let rows: Vec<ChannelRow> = sqlx::query_as(
            "SELECT id, workspace_id, name, description, is_private, created_by, created_at \
             FROM channels WHERE workspace_id = $1 ORDER BY created_at",
        )
        .bind(workspace.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_message(
        &self,
        channel: ChannelId,
        sender: UserId,
        content: &str,
    ) -> Result<Message, StoreError> {
        let row: MessageRow = sqlx::query_as(
            "INSERT INTO messages (id, channel_id, sender_id, content) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, channel_id, sender_id, content, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(channel.as_uuid())
        .bind(sender.as_uuid())
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    async fn messages_for_channel(&self, channel: ChannelId) -> Result<Vec<Message>, StoreError> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id, channel_id, sender_id, content, created_at \
             FROM messages WHERE channel_id = $1 ORDER BY created_at",
        )
        .bind(channel.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn search_messages(
        &self,
        workspace: WorkspaceId,
        query: &str,
    ) -> Result<Vec<Message>, StoreError> {
        let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT m.id, m.channel_id, m.sender_id, m.content, m.created_at \
             FROM messages m \
             JOIN channels c ON c.id = m.channel_id \
             WHERE c.workspace_id = $1 AND m.content ILIKE $2 \
             ORDER BY m.created_at DESC \
             LIMIT 50",
        )
        .bind(workspace.as_uuid())
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_direct_message(
        &self,
        sender: UserId,
        receiver: UserId,
        content: &str,
    ) -> Result<DirectMessage, StoreError> {
        let row: DirectMessageRow = sqlx::query_as(
            "INSERT INTO direct_messages (id, sender_id, receiver_id, content) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, sender_id, receiver_id, content, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(sender.as_uuid())
        .bind(receiver.as_uuid())
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(row.into())
    }

    async fn direct_messages_between(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Vec<DirectMessage>, StoreError> {
        let rows: Vec<DirectMessageRow> = sqlx::query_as(
            "SELECT id, sender_id, receiver_id, content, created_at \
             FROM direct_messages \
             WHERE (sender_id = $1 AND receiver_id = $2) \
                OR (sender_id = $2 AND receiver_id = $1) \
             ORDER BY created_at",
        )
        .bind(a.as_uuid())
        .bind(b.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
