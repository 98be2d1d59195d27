use super::manager::SessionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Periodically drop sessions idle for longer than the TTL
pub fn spawn_sweeper(manager: Arc<SessionManager>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Session sweeper started (every {}s)", every.as_secs());

        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let expired = manager.sweep_expired().await;
            for id in &expired {
                debug!("Swept idle session {}", id);
            }
        }
    })
}
