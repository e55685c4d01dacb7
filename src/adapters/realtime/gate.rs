//! Access gate: may this user receive or emit events for this channel?
//!
//! Delegates to the data-access interface's workspace membership query.
//! The check is re-evaluated per broadcast, never cached across calls,
//! because membership can change between subscription and delivery. On
//! any lookup failure or missing channel the gate denies.

use std::sync::Arc;

use crate::domain::foundation::{ChannelId, UserId};
use crate::ports::ChatStore;

/// Membership-backed access decisions for channel events.
pub struct AccessGate {
    store: Arc<dyn ChatStore>,
}

impl AccessGate {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    /// True iff the user is a member of the channel's workspace.
    pub async fn can_receive(&self, user: UserId, channel: ChannelId) -> bool {
        let channel_record = match self.store.get_channel(channel).await {
            Ok(Some(record)) => record,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(%channel, error = %e, "channel lookup failed, denying access");
                return false;
            }
        };

        match self
            .store
            .is_workspace_member(channel_record.workspace_id, user)
            .await
        {
            Ok(member) => member,
            Err(e) => {
                tracing::warn!(%user, %channel, error = %e, "membership lookup failed, denying access");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryStore;
    use crate::domain::chat::MemberRole;
    use crate::ports::{NewChannel, NewUser};

    async fn fixture() -> (Arc<InMemoryStore>, UserId, UserId, ChannelId) {
        let store = Arc::new(InMemoryStore::new());
        let member = store
            .create_user(NewUser {
                email: "member@example.com".into(),
                password_hash: "h".into(),
                name: "Member".into(),
            })
            .await
            .unwrap();
        let outsider = store
            .create_user(NewUser {
                email: "outsider@example.com".into(),
                password_hash: "h".into(),
                name: "Outsider".into(),
            })
            .await
            .unwrap();
        let ws = store.create_workspace("acme", member.id).await.unwrap();
        store
            .add_workspace_member(ws.id, member.id, MemberRole::Owner)
            .await
            .unwrap();
        let channel = store
            .create_channel(NewChannel {
                workspace_id: ws.id,
                name: "general".into(),
                description: None,
                is_private: false,
                created_by: member.id,
            })
            .await
            .unwrap();
        (store, member.id, outsider.id, channel.id)
    }

    #[tokio::test]
    async fn member_passes_gate() {
        let (store, member, _, channel) = fixture().await;
        let gate = AccessGate::new(store);
        assert!(gate.can_receive(member, channel).await);
    }

    #[tokio::test]
    async fn non_member_is_denied() {
        let (store, _, outsider, channel) = fixture().await;
        let gate = AccessGate::new(store);
        assert!(!gate.can_receive(outsider, channel).await);
    }

    #[tokio::test]
    async fn unknown_channel_is_denied() {
        let (store, member, _, _) = fixture().await;
        let gate = AccessGate::new(store);
        assert!(!gate.can_receive(member, ChannelId::new()).await);
    }
}
