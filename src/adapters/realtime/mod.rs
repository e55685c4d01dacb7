//! Real-time fan-out layer.
//!
//! Maps authenticated WebSocket connections to users, workspaces and
//! channels, and pushes events to the correct subset of connected
//! clients while re-checking the same access rules the REST layer
//! enforces.
//!
//! # Architecture
//!
//! ```text
//! REST handler ──┐                       ┌── ConnectionRegistry
//!                ├── RealtimeHub ────────┼── SubscriptionTable
//! WS read loop ──┘   (broadcaster +      ├── PresenceTracker
//!                     inbound router)    └── AccessGate ── ChatStore
//! ```
//!
//! The hub serializes each outbound event exactly once, fans it out over
//! per-connection channels, and reaps any connection whose send fails.

mod events;
mod gate;
mod handler;
mod hub;
mod presence;
mod registry;
mod subscriptions;

pub use events::{
    parse_client_frame, ClientEvent, DmEvent, DmTypingEvent, MessageEvent, PresenceEvent,
    ServerEvent, TypingEvent,
};
pub use gate::AccessGate;
pub use handler::ws_upgrade;
pub use hub::{BroadcastTarget, RealtimeHub};
pub use presence::{PresenceStatus, PresenceTracker};
pub use registry::{ConnectionHandle, ConnectionRegistry};
pub use subscriptions::SubscriptionTable;
