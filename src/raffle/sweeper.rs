use std::sync::Arc;
use std::time::SystemTime;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::server::RaffleServer;

/// Periodically evict rooms that outlived their time-to-live.
///
/// The first sweep happens one interval after startup.
pub fn spawn_expiry_sweeper(server: Arc<RaffleServer>) -> JoinHandle<()> {
    let period = server.limits().sweep_interval;

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval = ?period, ttl = ?server.limits().room_ttl, "Expiry sweeper started");

        loop {
            ticker.tick().await;
            let expired = server.sweep_expired(SystemTime::now()).await;
            if expired.is_empty() {
                tracing::debug!("Expiry sweep found nothing to evict");
            } else {
                tracing::info!(count = expired.len(), rooms = ?expired, "Expiry sweep evicted rooms");
            }
        }
    })
}
