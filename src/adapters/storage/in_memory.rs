//! In-memory implementation of the `ChatStore` port.
//!
//! A single `RwLock` over plain maps. Used by every test and as the
//! fallback store when no database URL is configured.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::chat::{Channel, DirectMessage, MemberRole, Message, User, Workspace};
use crate::domain::foundation::{
    ChannelId, DirectMessageId, MessageId, UserId, WorkspaceId,
};
use crate::ports::{ChatStore, NewChannel, NewUser, StoreError, UserUpdate};

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    workspaces: HashMap<WorkspaceId, Workspace>,
    /// (workspace, user) -> role
    members: HashMap<(WorkspaceId, UserId), MemberRole>,
    channels: HashMap<ChannelId, Channel>,
    messages: Vec<Message>,
    direct_messages: Vec<DirectMessage>,
}

/// Process-local chat store.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(StoreError::DuplicateEmail);
        }

        let record = User {
            id: UserId::new(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            avatar: None,
            status_message: None,
            created_at: Utc::now(),
        };
        inner.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or(StoreError::NotFound("user"))?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(avatar) = update.avatar {
            user.avatar = Some(avatar);
        }
        if let Some(status) = update.status_message {
            user.status_message = Some(status);
        }
        Ok(user.clone())
    }

    async fn create_workspace(&self, name: &str, owner: UserId) -> Result<Workspace, StoreError> {
        let mut inner = self.inner.write().await;
        let workspace = Workspace {
            id: WorkspaceId::new(),
            name: name.to_string(),
            owner_id: owner,
            created_at: Utc::now(),
        };
        inner.workspaces.insert(workspace.id, workspace.clone());
        Ok(workspace)
    }

    async fn get_workspace(&self, id: WorkspaceId) -> Result<Option<Workspace>, StoreError> {
        Ok(self.inner.read().await.workspaces.get(&id).cloned())
    }

    async fn workspaces_for_user(&self, user: UserId) -> Result<Vec<Workspace>, StoreError> {
        let inner = self.inner.read().await;
        let mut workspaces: Vec<Workspace> = inner
            .members
            .keys()
            .filter(|(_, u)| *u == user)
            .filter_map(|(w, _)| inner.workspaces.get(w).cloned())
            .collect();
        workspaces.sort_by_key(|w| w.created_at);
        Ok(workspaces)
    }

    async fn add_workspace_member(
        &self,
        workspace: WorkspaceId,
        user: UserId,
        role: MemberRole,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.workspaces.contains_key(&workspace) {
            return Err(StoreError::NotFound("workspace"));
        }
        inner.members.entry((workspace, user)).or_insert(role);
        Ok(())
    }

    async fn workspace_members(&self, workspace: WorkspaceId) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .members
            .keys()
            .filter(|(w, _)| *w == workspace)
            .filter_map(|(_, u)| inner.users.get(u).cloned())
            .collect())
    }

    async fn is_workspace_member(
        &self,
        workspace: WorkspaceId,
        user: UserId,
    ) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .members
            .contains_key(&(workspace, user)))
    }

    async fn create_channel(&self, channel: NewChannel) -> Result<Channel, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.workspaces.contains_key(&channel.workspace_id) {
            return Err(StoreError::NotFound("workspace"));
        }
        let record = Channel {
            id: ChannelId::new(),
            workspace_id: channel.workspace_id,
            name: channel.name,
            description: channel.description,
            is_private: channel.is_private,
            created_by: channel.created_by,
            created_at: Utc::now(),
        };
        inner.channels.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_channel(&self, id: ChannelId) -> Result<Option<Channel>, StoreError> {
        Ok(self.inner.read().await.channels.get(&id).cloned())
    }

    async fn channels_for_workspace(
        &self,
        workspace: WorkspaceId,
    ) -> Result<Vec<Channel>, StoreError> {
        let inner = self.inner.read().await;
        let mut channels: Vec<Channel> = inner
            .channels
            .values()
            .filter(|c| c.workspace_id == workspace)
            .cloned()
            .collect();
        channels.sort_by_key(|c| c.created_at);
        Ok(channels)
    }

    async fn create_message(
        &self,
        channel: ChannelId,
        sender: UserId,
        content: &str,
    ) -> Result<Message, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.channels.contains_key(&channel) {
            return Err(StoreError::NotFound("channel"));
        }
        let message = Message {
            id: MessageId::new(),
            channel_id: channel,
            sender_id: sender,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn messages_for_channel(&self, channel: ChannelId) -> Result<Vec<Message>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .messages
            .iter()
            .filter(|m| m.channel_id == channel)
            .cloned()
            .collect())
    }

    async fn search_messages(
        &self,
        workspace: WorkspaceId,
        query: &str,
    ) -> Result<Vec<Message>, StoreError> {
        let inner = self.inner.read().await;
        let needle = query.to_lowercase();
        let mut hits: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| {
                inner
                    .channels
                    .get(&m.channel_id)
                    .is_some_and(|c| c.workspace_id == workspace)
                    && m.content.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        // Newest first, capped, matching the SQL adapter.
        hits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        hits.truncate(50);
        Ok(hits)
    }

    async fn create_direct_message(
        &self,
        sender: UserId,
        receiver: UserId,
        content: &str,
    ) -> Result<DirectMessage, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&receiver) {
            return Err(StoreError::NotFound("user"));
        }
        let dm = DirectMessage {
            id: DirectMessageId::new(),
            sender_id: sender,
            receiver_id: receiver,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        inner.direct_messages.push(dm.clone());
        Ok(dm)
    }

    async fn direct_messages_between(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Vec<DirectMessage>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .direct_messages
            .iter()
            .filter(|m| {
                (m.sender_id == a && m.receiver_id == b)
                    || (m.sender_id == b && m.receiver_id == a)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user(store: &InMemoryStore, email: &str, name: &str) -> User {
        store
            .create_user(NewUser {
                email: email.into(),
                password_hash: "hash".into(),
                name: name.into(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let store = InMemoryStore::new();
        user(&store, "alice@example.com", "Alice").await;

        let result = store
            .create_user(NewUser {
                email: "ALICE@example.com".into(),
                password_hash: "hash".into(),
                name: "Other Alice".into(),
            })
            .await;

        assert!(matches!(result, Err(StoreError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn workspace_membership_tracks_members() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice@example.com", "Alice").await;
        let bob = user(&store, "bob@example.com", "Bob").await;

        let ws = store.create_workspace("acme", alice.id).await.unwrap();
        store
            .add_workspace_member(ws.id, alice.id, MemberRole::Owner)
            .await
            .unwrap();
        store
            .add_workspace_member(ws.id, bob.id, MemberRole::Member)
            .await
            .unwrap();

        assert!(store.is_workspace_member(ws.id, alice.id).await.unwrap());
        assert!(store.is_workspace_member(ws.id, bob.id).await.unwrap());
        assert_eq!(store.workspace_members(ws.id).await.unwrap().len(), 2);

        let carol = user(&store, "carol@example.com", "Carol").await;
        assert!(!store.is_workspace_member(ws.id, carol.id).await.unwrap());
    }

    #[tokio::test]
    async fn adding_member_twice_is_idempotent() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice@example.com", "Alice").await;
        let ws = store.create_workspace("acme", alice.id).await.unwrap();

        store
            .add_workspace_member(ws.id, alice.id, MemberRole::Owner)
            .await
            .unwrap();
        store
            .add_workspace_member(ws.id, alice.id, MemberRole::Member)
            .await
            .unwrap();

        let members = store.workspace_members(ws.id).await.unwrap();
        assert_eq!(members.len(), 1);
    }

    #[tokio::test]
    async fn search_is_scoped_to_workspace_and_case_insensitive() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice@example.com", "Alice").await;
        let ws1 = store.create_workspace("one", alice.id).await.unwrap();
        let ws2 = store.create_workspace("two", alice.id).await.unwrap();

        let mk_channel = |ws: WorkspaceId| NewChannel {
            workspace_id: ws,
            name: "general".into(),
            description: None,
            is_private: false,
            created_by: alice.id,
        };
        let c1 = store.create_channel(mk_channel(ws1.id)).await.unwrap();
        let c2 = store.create_channel(mk_channel(ws2.id)).await.unwrap();

        store
            .create_message(c1.id, alice.id, "Deploy finished")
            .await
            .unwrap();
        store
            .create_message(c2.id, alice.id, "deploy pending")
            .await
            .unwrap();

        let hits = store.search_messages(ws1.id, "DEPLOY").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].channel_id, c1.id);
    }

    #[tokio::test]
    async fn search_returns_newest_first_capped_at_fifty() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice@example.com", "Alice").await;
        let ws = store.create_workspace("one", alice.id).await.unwrap();
        let channel = store
            .create_channel(NewChannel {
                workspace_id: ws.id,
                name: "general".into(),
                description: None,
                is_private: false,
                created_by: alice.id,
            })
            .await
            .unwrap();

        for i in 0..55 {
            store
                .create_message(channel.id, alice.id, &format!("report {i}"))
                .await
                .unwrap();
        }

        let hits = store.search_messages(ws.id, "report").await.unwrap();
        assert_eq!(hits.len(), 50);
        assert_eq!(hits[0].content, "report 54");
        assert!(hits.iter().all(|m| m.content != "report 0"));
    }

    #[tokio::test]
    async fn direct_messages_are_bidirectional() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice@example.com", "Alice").await;
        let bob = user(&store, "bob@example.com", "Bob").await;

        store
            .create_direct_message(alice.id, bob.id, "hi bob")
            .await
            .unwrap();
        store
            .create_direct_message(bob.id, alice.id, "hi alice")
            .await
            .unwrap();

        let thread = store
            .direct_messages_between(alice.id, bob.id)
            .await
            .unwrap();
        assert_eq!(thread.len(), 2);

        let reversed = store
            .direct_messages_between(bob.id, alice.id)
            .await
            .unwrap();
        assert_eq!(reversed.len(), 2);
    }

    #[tokio::test]
    async fn update_user_applies_only_provided_fields() {
        let store = InMemoryStore::new();
        let alice = user(&store, "alice@example.com", "Alice").await;

        let updated = store
            .update_user(
                alice.id,
                UserUpdate {
                    status_message: Some("in a meeting".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Alice");
        assert_eq!(updated.status_message.as_deref(), Some("in a meeting"));
    }
}
