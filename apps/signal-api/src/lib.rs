pub mod config;
pub mod error;
pub mod gateway;
pub mod routes;

use std::sync::Arc;

use config::Config;
use gateway::fanout::{ConnectionHub, Transport};
use gateway::registry::RoomRegistry;
use gateway::relay::SignalingRelay;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rooms: Arc<RoomRegistry>,
    pub hub: Arc<ConnectionHub>,
    pub relay: Arc<SignalingRelay>,
}

impl AppState {
    /// Wire a fresh, empty registry and hub together.
    pub fn new(config: Config) -> Self {
        let rooms = Arc::new(RoomRegistry::new());
        let hub = Arc::new(ConnectionHub::new());
        let transport: Arc<dyn Transport> = hub.clone();
        let relay = Arc::new(SignalingRelay::new(rooms.clone(), transport));
        Self {
            config: Arc::new(config),
            rooms,
            hub,
            relay,
        }
    }
}
