//! Connection registry: live WebSocket connections per user.
//!
//! A user may hold several concurrent connections (tabs, devices). Each
//! connection is represented by a [`ConnectionHandle`] wrapping the
//! sender half of an unbounded channel; the paired receiver is drained
//! by that connection's writer task. Sends therefore never block the
//! broadcaster, and a send failure means the writer task is gone, i.e.
//! the connection is dead.
//!
//! # Thread Safety
//!
//! One `RwLock` guards both indexes (per-user sets and the flat
//! id -> handle map) so they can never disagree. Reads for fan-out take
//! snapshots; iterating a snapshot while another task unregisters is
//! safe.

use std::collections::{HashMap, HashSet};

use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

use crate::domain::foundation::{ConnectionId, UserId};

/// Handle to one live connection.
///
/// Cheap to clone; all clones share the same underlying channel.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    user_id: UserId,
    sender: mpsc::UnboundedSender<Message>,
}

impl ConnectionHandle {
    /// Create a handle and the receiver its writer task should drain.
    pub fn new(user_id: UserId) -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                id: ConnectionId::new(),
                user_id,
                sender: tx,
            },
            rx,
        )
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Non-blocking send. An error means the receiving writer task has
    /// dropped the channel: the connection is dead.
    pub fn send(&self, message: Message) -> Result<(), ()> {
        self.sender.send(message).map_err(|_| ())
    }
}

#[derive(Default)]
struct Indexes {
    by_user: HashMap<UserId, HashSet<ConnectionId>>,
    by_id: HashMap<ConnectionId, ConnectionHandle>,
}

/// Maps user ids to their live connections.
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: RwLock<Indexes>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. Returns true if this is the user's first live
    /// connection (an offline -> online presence transition).
    pub async fn register(&self, handle: ConnectionHandle) -> bool {
        let mut inner = self.inner.write().await;
        let set = inner.by_user.entry(handle.user_id()).or_default();
        let first = set.is_empty();
        set.insert(handle.id());
        inner.by_id.insert(handle.id(), handle);
        first
    }

    /// Remove a connection. Returns true if the user's set became empty
    /// (an online -> offline presence transition). Unregistering a
    /// connection that was never registered is a no-op returning false.
    pub async fn unregister(&self, user: UserId, connection: ConnectionId) -> bool {
        let mut inner = self.inner.write().await;
        if inner.by_id.remove(&connection).is_none() {
            return false;
        }
        match inner.by_user.get_mut(&user) {
            Some(set) => {
                set.remove(&connection);
                if set.is_empty() {
                    // Empty sets are removed outright, not leaked.
                    inner.by_user.remove(&user);
                    true
                } else {
                    false
                }
            }
            None => false,
        }
    }

    /// Snapshot of one user's connections.
    pub async fn connections_for(&self, user: UserId) -> Vec<ConnectionHandle> {
        let inner = self.inner.read().await;
        inner
            .by_user
            .get(&user)
            .map(|set| {
                set.iter()
                    .filter_map(|id| inner.by_id.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Snapshot of all connections belonging to any of the given users,
    /// skipping `exclude` entirely (every one of their connections).
    pub async fn connections_for_users(
        &self,
        users: &[UserId],
        exclude: Option<UserId>,
    ) -> Vec<ConnectionHandle> {
        let inner = self.inner.read().await;
        let mut handles = Vec::new();
        for user in users {
            if Some(*user) == exclude {
                continue;
            }
            if let Some(set) = inner.by_user.get(user) {
                handles.extend(set.iter().filter_map(|id| inner.by_id.get(id).cloned()));
            }
        }
        handles
    }

    /// Resolve subscription table entries to live handles. Ids whose
    /// connection has already been unregistered are silently skipped.
    pub async fn resolve(&self, ids: &[ConnectionId]) -> Vec<ConnectionHandle> {
        let inner = self.inner.read().await;
        ids.iter()
            .filter_map(|id| inner.by_id.get(id).cloned())
            .collect()
    }

    /// Number of live connections for a user.
    pub async fn connection_count(&self, user: UserId) -> usize {
        self.inner
            .read()
            .await
            .by_user
            .get(&user)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}
