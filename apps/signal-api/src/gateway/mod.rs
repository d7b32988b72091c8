pub mod events;
pub mod fanout;
pub mod registry;
pub mod relay;
pub mod server;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use registry::RoomRegistry;

/// Periodically drop rooms that were created but never joined.
pub fn spawn_reservation_sweeper(
    rooms: Arc<RoomRegistry>,
    ttl: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(ttl.max(Duration::from_secs(1)) / 2);
        loop {
            ticker.tick().await;
            let removed = rooms.sweep_unjoined(ttl);
            if removed > 0 {
                tracing::info!(removed, "expired unjoined rooms");
            }
        }
    })
}
