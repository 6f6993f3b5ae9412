//! Background cache warmer.
//!
//! Proactive only: the service's cache-aside path already self-heals on
//! miss, so a failed sweep degrades freshness, not correctness.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::service::RateService;

/// Spawns the periodic refresh of all catalog currencies. One refresh
/// runs immediately, then one per `interval` tick until `stop` observes
/// `true`; no tick is scheduled after cancellation. Join the returned
/// handle on shutdown.
pub fn spawn_refresh_loop(
    service: Arc<RateService>,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(?interval, "Starting rate refresh ticker");
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately and doubles as the startup
        // refresh.
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let summary = service.refresh_rates().await;
                    info!(
                        refreshed = summary.refreshed,
                        failed = summary.failed,
                        "Exchange rates refreshed"
                    );
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        info!("Rate refresh ticker stopped");
                        return;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::error::RateError;
    use crate::rate::{RateProvider, RateRecord};
    use crate::service::RateCache;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RateProvider for CountingProvider {
        async fn latest_rate(&self, base: &str) -> Result<RateRecord, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let rates = Catalog::builtin()
                .codes()
                .map(|code| (code.to_string(), 1.5))
                .collect::<HashMap<_, _>>();
            Ok(RateRecord::new(base, rates))
        }

        async fn rate_by_date(
            &self,
            base: &str,
            _quote: &str,
            _date: NaiveDate,
        ) -> Result<RateRecord, RateError> {
            self.latest_rate(base).await
        }

        async fn rates_for_range(
            &self,
            _base: &str,
            _quote: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<(NaiveDate, RateRecord)>, RateError> {
            Ok(Vec::new())
        }
    }

    fn setup() -> (Arc<CountingProvider>, Arc<RateService>) {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let service = Arc::new(RateService::new(
            Arc::clone(&provider) as Arc<dyn RateProvider>,
            Arc::new(RateCache::new()),
            Catalog::builtin(),
            Duration::from_secs(3600),
            90,
        ));
        (provider, service)
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_refresh_runs_at_startup() {
        let (provider, service) = setup();
        let catalog_len = service.catalog().len();

        let (_stop_tx, stop_rx) = watch::channel(false);
        let handle = spawn_refresh_loop(Arc::clone(&service), Duration::from_secs(600), stop_rx);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), catalog_len);

        // The primed cache serves lookups without further provider calls.
        assert_eq!(service.get_latest_rate("EUR", "USD").await.unwrap(), 1.5);
        assert_eq!(provider.calls.load(Ordering::SeqCst), catalog_len);

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_refresh_again() {
        let (provider, service) = setup();
        let catalog_len = service.catalog().len();

        let (_stop_tx, stop_rx) = watch::channel(false);
        let handle = spawn_refresh_loop(Arc::clone(&service), Duration::from_secs(600), stop_rx);

        tokio::time::sleep(Duration::from_millis(1)).await;
        tokio::time::advance(Duration::from_secs(601)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2 * catalog_len);
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_signal_ends_the_loop() {
        let (provider, service) = setup();
        let catalog_len = service.catalog().len();

        let (stop_tx, stop_rx) = watch::channel(false);
        let handle = spawn_refresh_loop(service, Duration::from_secs(600), stop_rx);

        tokio::time::sleep(Duration::from_millis(1)).await;
        stop_tx.send(true).unwrap();
        handle.await.unwrap();

        // No further ticks after cancellation.
        tokio::time::advance(Duration::from_secs(3600)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), catalog_len);
    }
}
