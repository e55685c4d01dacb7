//! Shared application state for the HTTP and WebSocket layers.

use std::sync::Arc;

use crate::adapters::auth::JwtAuthService;
use crate::adapters::realtime::RealtimeHub;
use crate::ports::{ChatStore, SessionValidator};

/// Handler state, cloned per request. Every field is an `Arc`, so clones
/// are pointer bumps.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ChatStore>,
    pub tokens: Arc<JwtAuthService>,
    pub validator: Arc<dyn SessionValidator>,
    pub hub: Arc<RealtimeHub>,
    /// Bcrypt work factor from configuration.
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ChatStore>,
        tokens: Arc<JwtAuthService>,
        validator: Arc<dyn SessionValidator>,
        hub: Arc<RealtimeHub>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            store,
            tokens,
            validator,
            hub,
            bcrypt_cost,
        }
    }
}
