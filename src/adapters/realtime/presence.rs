//! Presence tracker: which users currently have at least one live
//! connection.
//!
//! State machine per user: offline -> online on the first registered
//! connection, online -> offline when the last one closes. Entries are
//! toggled for the life of the process, never deleted, so the
//! last-transition timestamp survives reconnects.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::foundation::UserId;

/// Presence of a single user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceStatus {
    Online,
    Offline,
}

impl PresenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceStatus::Online => "online",
            PresenceStatus::Offline => "offline",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PresenceEntry {
    status: PresenceStatus,
    since: DateTime<Utc>,
}

/// Process-wide presence state.
#[derive(Default)]
pub struct PresenceTracker {
    entries: RwLock<HashMap<UserId, PresenceEntry>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the user as online. Returns true if this was an actual
    /// offline -> online transition.
    pub async fn mark_online(&self, user: UserId) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get(&user) {
            Some(entry) if entry.status == PresenceStatus::Online => false,
            _ => {
                entries.insert(
                    user,
                    PresenceEntry {
                        status: PresenceStatus::Online,
                        since: Utc::now(),
                    },
                );
                true
            }
        }
    }

    /// Record the user as offline. Returns true if this was an actual
    /// online -> offline transition.
    pub async fn mark_offline(&self, user: UserId) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&user) {
            Some(entry) if entry.status == PresenceStatus::Online => {
                entry.status = PresenceStatus::Offline;
                entry.since = Utc::now();
                true
            }
            _ => false,
        }
    }

    /// Current status; users never seen are offline.
    pub async fn status_of(&self, user: UserId) -> PresenceStatus {
        self.entries
            .read()
            .await
            .get(&user)
            .map(|e| e.status)
            .unwrap_or(PresenceStatus::Offline)
    }

    /// Timestamp of the user's last transition, if any.
    pub async fn since(&self, user: UserId) -> Option<DateTime<Utc>> {
        self.entries.read().await.get(&user).map(|e| e.since)
    }
}
