//! Broadcaster and inbound event router.
//!
//! The hub owns the connection registry, subscription table, presence
//! tracker and access gate, and is the only component that fans events
//! out. Every broadcast serializes the event once, clones the frame per
//! recipient, and reaps connections whose send fails. Delivery failures
//! never propagate to callers; a REST write that committed stays
//! committed even if every live push fails.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::domain::foundation::{ChannelId, ConnectionId, Principal, UserId};
use crate::ports::ChatStore;

use super::events::{ClientEvent, DmTypingEvent, PresenceEvent, ServerEvent, TypingEvent};
use super::gate::AccessGate;
use super::presence::{PresenceStatus, PresenceTracker};
use super::registry::{ConnectionHandle, ConnectionRegistry};
use super::subscriptions::SubscriptionTable;

/// Who an event should reach.
#[derive(Debug, Clone, Copy)]
pub enum BroadcastTarget {
    /// Every workspace member of the channel, on all their connections.
    /// Used for persisted messages; reaches members who never
    /// subscribed.
    Channel(ChannelId),

    /// Only connections subscribed to the channel, each re-checked
    /// against the access gate. Used for ephemeral events like typing.
    Topic(ChannelId),

    /// All of one user's connections. No gate; used for direct
    /// messages and DM typing.
    User(UserId),
}

/// Central fan-out hub shared by the WebSocket handler and the REST
/// layer.
pub struct RealtimeHub {
    store: Arc<dyn ChatStore>,
    registry: ConnectionRegistry,
    subscriptions: SubscriptionTable,
    presence: PresenceTracker,
    gate: AccessGate,
}

impl RealtimeHub {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self {
            gate: AccessGate::new(Arc::clone(&store)),
            store,
            registry: ConnectionRegistry::new(),
            subscriptions: SubscriptionTable::new(),
            presence: PresenceTracker::new(),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn subscriptions(&self) -> &SubscriptionTable {
        &self.subscriptions
    }

    pub fn presence(&self) -> &PresenceTracker {
        &self.presence
    }

    /// Register a new connection. Announces `presence:update` to the
    /// user's workspace peers only on the offline -> online transition,
    /// so a second tab is silent.
    pub async fn connect(&self, handle: ConnectionHandle) {
        let user = handle.user_id();
        let first = self.registry.register(handle).await;
        if first && self.presence.mark_online(user).await {
            self.announce_presence(user, PresenceStatus::Online).await;
        }
    }

    /// Tear down a connection: drop its subscriptions, unregister it,
    /// and announce offline presence if it was the user's last one.
    /// Safe to call twice for the same connection.
    pub async fn disconnect(&self, user: UserId, connection: ConnectionId) {
        self.subscriptions.unsubscribe_all(connection).await;
        let last = self.registry.unregister(user, connection).await;
        if last && self.presence.mark_offline(user).await {
            self.announce_presence(user, PresenceStatus::Offline).await;
        }
    }

    /// Route one parsed inbound event from a connection's read loop.
    pub async fn handle_client_event(
        &self,
        connection: &ConnectionHandle,
        principal: &Principal,
        event: ClientEvent,
    ) {
        let user = connection.user_id();
        match event {
            ClientEvent::ChannelSubscribe { channel_id } => {
                self.subscriptions.subscribe(connection.id(), channel_id).await;
            }
            ClientEvent::ChannelUnsubscribe { channel_id } => {
                self.subscriptions.unsubscribe(connection.id(), channel_id).await;
            }
            ClientEvent::TypingStart { channel_id } | ClientEvent::TypingStop { channel_id } => {
                if !self.gate.can_receive(user, channel_id).await {
                    tracing::debug!(%user, %channel_id, "typing event from non-member dropped");
                    return;
                }
                let payload = TypingEvent {
                    channel_id,
                    user_id: user,
                    user_name: principal.display_name.clone(),
                };
                let outbound = if matches!(event, ClientEvent::TypingStart { .. }) {
                    ServerEvent::TypingStart(payload)
                } else {
                    ServerEvent::TypingStop(payload)
                };
                self.broadcast(BroadcastTarget::Topic(channel_id), &outbound, Some(user))
                    .await;
            }
            ClientEvent::DmTypingStart { receiver_id } | ClientEvent::DmTypingStop { receiver_id } => {
                let payload = DmTypingEvent {
                    sender_id: user,
                    receiver_id,
                    sender_name: Some(principal.display_name.clone()),
                };
                let outbound = if matches!(event, ClientEvent::DmTypingStart { .. }) {
                    ServerEvent::DmTypingStart(payload)
                } else {
                    ServerEvent::DmTypingStop(payload)
                };
                self.broadcast(BroadcastTarget::User(receiver_id), &outbound, None)
                    .await;
            }
        }
    }

    /// Fan an event out to the target audience, excluding every
    /// connection of `exclude` (the acting user sees their own action
    /// locally; an echo would double-render it).
    ///
    /// Returns the number of connections the frame was handed to. Zero
    /// recipients is a normal outcome, not an error.
    pub async fn broadcast(
        &self,
        target: BroadcastTarget,
        event: &ServerEvent,
        exclude: Option<UserId>,
    ) -> usize {
        let frame = match event.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize outbound event");
                return 0;
            }
        };

        let handles = match target {
            BroadcastTarget::Channel(channel_id) => {
                self.channel_audience(channel_id, exclude).await
            }
            BroadcastTarget::Topic(channel_id) => self.topic_audience(channel_id, exclude).await,
            BroadcastTarget::User(user_id) => {
                if exclude == Some(user_id) {
                    Vec::new()
                } else {
                    self.registry.connections_for(user_id).await
                }
            }
        };

        let total = handles.len();
        let dead = fan_out(&handles, &frame);
        let failed = dead.len();
        if failed > 0 {
            self.reap(dead).await;
        }
        total - failed
    }

    /// All connections of the channel's workspace members.
    async fn channel_audience(
        &self,
        channel_id: ChannelId,
        exclude: Option<UserId>,
    ) -> Vec<ConnectionHandle> {
        let channel = match self.store.get_channel(channel_id).await {
            Ok(Some(channel)) => channel,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(%channel_id, error = %e, "channel lookup failed, skipping broadcast");
                return Vec::new();
            }
        };
        let members = match self.store.workspace_members(channel.workspace_id).await {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!(%channel_id, error = %e, "member lookup failed, skipping broadcast");
                return Vec::new();
            }
        };
        let ids: Vec<UserId> = members.into_iter().map(|u| u.id).collect();
        self.registry.connections_for_users(&ids, exclude).await
    }

    /// Subscribed connections, filtered through the access gate. The
    /// gate verdict is memoized per user for the duration of this one
    /// broadcast only.
    async fn topic_audience(
        &self,
        channel_id: ChannelId,
        exclude: Option<UserId>,
    ) -> Vec<ConnectionHandle> {
        let subscriber_ids = self.subscriptions.subscribers_of(channel_id).await;
        let candidates = self.registry.resolve(&subscriber_ids).await;

        let mut verdicts: HashMap<UserId, bool> = HashMap::new();
        let mut audience = Vec::with_capacity(candidates.len());
        for handle in candidates {
            let user = handle.user_id();
            if Some(user) == exclude {
                continue;
            }
            let allowed = match verdicts.get(&user) {
                Some(&v) => v,
                None => {
                    let v = self.gate.can_receive(user, channel_id).await;
                    verdicts.insert(user, v);
                    v
                }
            };
            if allowed {
                audience.push(handle);
            }
        }
        audience
    }

    /// Tell the user's workspace peers their presence changed. Dead
    /// connections discovered here are reaped like any other, so a
    /// presence broadcast can cascade into further offline
    /// announcements; each round removes connections from the
    /// registry, so the cascade always bottoms out.
    async fn announce_presence(&self, user: UserId, status: PresenceStatus) {
        let record = match self.store.get_user(user).await {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(%user, error = %e, "user lookup failed, presence not announced");
                return;
            }
        };

        let event = ServerEvent::PresenceUpdate(PresenceEvent {
            user_id: user,
            user_name: record.name,
            status: status.as_str(),
        });
        let frame = match event.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize presence event");
                return;
            }
        };

        let audience = self.presence_audience(user).await;
        let dead = fan_out(&audience, &frame);
        if !dead.is_empty() {
            self.reap(dead).await;
        }
    }

    /// Connections of every user sharing at least one workspace with
    /// `user`, deduplicated, never including `user` themselves.
    async fn presence_audience(&self, user: UserId) -> Vec<ConnectionHandle> {
        let workspaces = match self.store.workspaces_for_user(user).await {
            Ok(workspaces) => workspaces,
            Err(e) => {
                tracing::warn!(%user, error = %e, "workspace lookup failed, presence not announced");
                return Vec::new();
            }
        };

        let mut peers: HashSet<UserId> = HashSet::new();
        for workspace in workspaces {
            match self.store.workspace_members(workspace.id).await {
                Ok(members) => peers.extend(members.into_iter().map(|u| u.id)),
                Err(e) => {
                    tracing::warn!(workspace = %workspace.id, error = %e, "member lookup failed")
                }
            }
        }
        peers.remove(&user);

        let ids: Vec<UserId> = peers.into_iter().collect();
        self.registry.connections_for_users(&ids, None).await
    }

    /// Remove dead connections from every table; users who thereby lost
    /// their last connection get an offline presence broadcast. The
    /// announce call recurses back into reap, so it is boxed; the
    /// connections removed here are gone from the registry before it
    /// runs, which bounds the recursion depth.
    async fn reap(&self, dead: Vec<ConnectionHandle>) {
        let mut went_offline = Vec::new();
        for handle in dead {
            let user = handle.user_id();
            tracing::debug!(%user, connection = %handle.id(), "reaping dead connection");
            self.subscriptions.unsubscribe_all(handle.id()).await;
            let last = self.registry.unregister(user, handle.id()).await;
            if last && self.presence.mark_offline(user).await {
                went_offline.push(user);
            }
        }
        for user in went_offline {
            Box::pin(self.announce_presence(user, PresenceStatus::Offline)).await;
        }
    }
}

/// Clone the pre-serialized frame to each handle; return the handles
/// whose writer task is gone.
fn fan_out(
    handles: &[ConnectionHandle],
    frame: &axum::extract::ws::Message,
) -> Vec<ConnectionHandle> {
    let mut dead = Vec::new();
    for handle in handles {
        if handle.send(frame.clone()).is_err() {
            dead.push(handle.clone());
        }
    }
    dead
}
