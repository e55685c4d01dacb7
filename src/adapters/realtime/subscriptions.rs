//! Topic subscription table: which connections are watching which
//! channels.
//!
//! Subscription is a delivery filter for ephemeral events, never an
//! authorization grant: the access gate re-checks membership at every
//! broadcast, because a user's workspace membership can change after
//! they subscribe.
//!
//! A reverse index (connection -> topics) keeps `unsubscribe_all`
//! proportional to the topics that connection actually joined rather
//! than to all topics in the process.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;

use crate::domain::foundation::{ChannelId, ConnectionId};

#[derive(Default)]
struct Tables {
    by_topic: HashMap<ChannelId, HashSet<ConnectionId>>,
    by_connection: HashMap<ConnectionId, HashSet<ChannelId>>,
}

/// Channel subscription state for all live connections.
#[derive(Default)]
pub struct SubscriptionTable {
    inner: RwLock<Tables>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent: subscribing twice yields one membership entry.
    pub async fn subscribe(&self, connection: ConnectionId, topic: ChannelId) {
        let mut inner = self.inner.write().await;
        inner.by_topic.entry(topic).or_default().insert(connection);
        inner
            .by_connection
            .entry(connection)
            .or_default()
            .insert(topic);
    }

    /// Idempotent: removing a non-member is a no-op.
    pub async fn unsubscribe(&self, connection: ConnectionId, topic: ChannelId) {
        let mut inner = self.inner.write().await;
        if let Some(set) = inner.by_topic.get_mut(&topic) {
            set.remove(&connection);
            if set.is_empty() {
                inner.by_topic.remove(&topic);
            }
        }
        if let Some(topics) = inner.by_connection.get_mut(&connection) {
            topics.remove(&topic);
            if topics.is_empty() {
                inner.by_connection.remove(&connection);
            }
        }
    }

    /// Purge a connection from every topic it joined. Called on
    /// disconnect; safe to call repeatedly.
    pub async fn unsubscribe_all(&self, connection: ConnectionId) {
        let mut inner = self.inner.write().await;
        let Some(topics) = inner.by_connection.remove(&connection) else {
            return;
        };
        for topic in topics {
            if let Some(set) = inner.by_topic.get_mut(&topic) {
                set.remove(&connection);
                if set.is_empty() {
                    inner.by_topic.remove(&topic);
                }
            }
        }
    }

    /// Snapshot of a topic's subscribers.
    pub async fn subscribers_of(&self, topic: ChannelId) -> Vec<ConnectionId> {
        self.inner
            .read()
            .await
            .by_topic
            .get(&topic)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of topics a connection is subscribed to.
    pub async fn topic_count(&self, connection: ConnectionId) -> usize {
        self.inner
            .read()
            .await
            .by_connection
            .get(&connection)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn double_subscribe_yields_single_entry() {
        let table = SubscriptionTable::new();
        let conn = ConnectionId::new();
        let topic = ChannelId::new();

        table.subscribe(conn, topic).await;
        table.subscribe(conn, topic).await;

        assert_eq!(table.subscribers_of(topic).await.len(), 1);
        assert_eq!(table.topic_count(conn).await, 1);
    }

    #[tokio::test]
    async fn unsubscribe_nonmember_is_noop() {
        let table = SubscriptionTable::new();
        let topic = ChannelId::new();
        table.unsubscribe(ConnectionId::new(), topic).await;
        assert!(table.subscribers_of(topic).await.is_empty());
    }

    #[tokio::test]
    async fn unsubscribe_all_twice_leaves_no_residue() {
        let table = SubscriptionTable::new();
        let conn = ConnectionId::new();
        let t1 = ChannelId::new();
        let t2 = ChannelId::new();

        table.subscribe(conn, t1).await;
        table.subscribe(conn, t2).await;

        table.unsubscribe_all(conn).await;
        table.unsubscribe_all(conn).await;

        assert!(table.subscribers_of(t1).await.is_empty());
        assert!(table.subscribers_of(t2).await.is_empty());
        assert_eq!(table.topic_count(conn).await, 0);
    }

    #[tokio::test]
    async fn empty_topic_sets_are_removed() {
        let table = SubscriptionTable::new();
        let conn = ConnectionId::new();
        let topic = ChannelId::new();

        table.subscribe(conn, topic).await;
        table.unsubscribe(conn, topic).await;

        let inner = table.inner.read().await;
        assert!(inner.by_topic.is_empty());
        assert!(inner.by_connection.is_empty());
    }

    #[tokio::test]
    async fn topics_are_independent() {
        let table = SubscriptionTable::new();
        let c1 = ConnectionId::new();
        let c2 = ConnectionId::new();
        let t1 = ChannelId::new();
        let t2 = ChannelId::new();

        table.subscribe(c1, t1).await;
        table.subscribe(c2, t2).await;

        assert_eq!(table.subscribers_of(t1).await, vec![c1]);
        assert_eq!(table.subscribers_of(t2).await, vec![c2]);
    }
}
