use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::metrics::RATE_LIMIT_STORE_SIZE;
use crate::rate_limit::RateLimitStore;

// Periodic cleanup of expired rate-limit windows.
// Keeps memory bounded under lots of one-off identifiers.
pub fn spawn_sweeper(stores: Vec<Arc<RateLimitStore>>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Rate limit sweeper started (interval: {:?}, stores: {})", every, stores.len());

        loop {
            interval.tick().await;
            sweep_once(&stores);
        }
    })
}

// Sweep every store, refresh the size gauge with the total left
pub fn sweep_once(stores: &[Arc<RateLimitStore>]) -> usize {
    let mut removed = 0;
    let mut remaining = 0;
    for store in stores {
        removed += store.sweep_expired();
        remaining += store.len();
    }
    RATE_LIMIT_STORE_SIZE.set(remaining as f64);

    if removed > 0 {
        debug!(removed, remaining, "Swept expired rate limit windows");
    }
    removed
}
