use std::time::Duration;

use ballot_core::VoteService;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

/// Periodically reload the catalog so items added out of band (for example
/// by `ballot import` against the same database) become selectable.
///
/// A failed reload keeps the previous catalog and is retried next tick.
pub fn spawn_catalog_refresher(service: VoteService, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; the service already loaded.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let service = service.clone();
            match tokio::task::spawn_blocking(move || service.refresh_catalog()).await {
                Ok(Ok(size)) => tracing::trace!(items = size, "catalog reloaded"),
                Ok(Err(err)) => tracing::warn!(error = %err, "catalog reload failed"),
                Err(err) => tracing::warn!(error = %err, "catalog reload task failed"),
            }
        }
    })
}
