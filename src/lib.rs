pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod log;
pub mod providers;
pub mod rate;
pub mod refresh;
pub mod service;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::providers::crypto::CryptoProvider;
use crate::providers::fiat::FiatProvider;
use crate::providers::mock::MockProvider;
use crate::providers::router::ProviderRouter;
use crate::rate::RateProvider;
use crate::service::{RateCache, RateService};

#[derive(Debug, Clone)]
pub enum AppCommand {
    /// List the supported currencies.
    Currencies,
    /// Resolve a single rate, latest or historical.
    Rate {
        from: String,
        to: String,
        date: Option<NaiveDate>,
    },
    /// Convert an amount at one date's rate.
    Convert {
        from: String,
        to: String,
        amount: f64,
        date: Option<NaiveDate>,
    },
    /// Convert the same amount at two dates and show the difference.
    Compare {
        from: String,
        to: String,
        amount: f64,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
    },
    /// One rate per day over an inclusive date range.
    History {
        from: String,
        to: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    /// Keep the cache warm until interrupted.
    Watch,
}

/// Wires catalog, cache, adapters and router into a ready service.
/// With `providers.use_mock` set, the offline provider stands in for
/// both upstreams.
pub fn build_service(config: &AppConfig) -> Result<(Arc<RateService>, Arc<RateCache>)> {
    let catalog = Catalog::builtin();
    let cache = Arc::new(RateCache::new());

    let (fiat, crypto): (Arc<dyn RateProvider>, Arc<dyn RateProvider>) =
        if config.providers.use_mock {
            let mock = Arc::new(MockProvider::new(Arc::clone(&catalog)));
            (Arc::clone(&mock) as Arc<dyn RateProvider>, mock)
        } else {
            (
                Arc::new(FiatProvider::new(
                    &config.providers.fiat.base_url,
                    &config.providers.fiat.api_key,
                    config.providers.fiat.timeout(),
                )?),
                Arc::new(CryptoProvider::new(
                    &config.providers.crypto.base_url,
                    &config.providers.crypto.api_key,
                    config.providers.crypto.timeout(),
                )?),
            )
        };
    let router = Arc::new(ProviderRouter::new(fiat, crypto, Arc::clone(&catalog)));

    let service = Arc::new(RateService::new(
        router,
        Arc::clone(&cache),
        catalog,
        config.cache.ttl(),
        config.cache.max_historical_days,
    ));
    Ok((service, cache))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxrate starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let (service, cache) = build_service(&config)?;
    let (stop_tx, stop_rx) = watch::channel(false);
    let sweeper = cache.spawn_sweeper(config.cache.sweep_interval(), stop_rx);

    let outcome = execute(&service, &config, command).await;

    let _ = stop_tx.send(true);
    sweeper.await.context("Cache sweeper panicked")?;
    outcome
}

async fn execute(
    service: &Arc<RateService>,
    config: &AppConfig,
    command: AppCommand,
) -> Result<()> {
    match command {
        AppCommand::Currencies => {
            println!("{}", cli::currencies_table(service.catalog()));
            Ok(())
        }
        AppCommand::Rate { from, to, date } => {
            let rate = service.resolve_rate_by_date(&from, &to, date).await?;
            match date {
                Some(d) => println!("1 {from} = {rate} {to} on {d}"),
                None => println!("1 {from} = {rate} {to}"),
            }
            Ok(())
        }
        AppCommand::Convert {
            from,
            to,
            amount,
            date,
        } => {
            let result = service.convert_amount(&from, &to, amount, date).await?;
            println!(
                "{amount} {from} = {} {to} (rate {})",
                result.converted, result.rate
            );
            Ok(())
        }
        AppCommand::Compare {
            from,
            to,
            amount,
            from_date,
            to_date,
        } => {
            let result = service
                .compare_conversions(&from, &to, amount, from_date, to_date)
                .await?;
            println!(
                "{}",
                cli::comparison_table(&from, &to, amount, from_date, to_date, &result)
            );
            Ok(())
        }
        AppCommand::History {
            from,
            to,
            start,
            end,
        } => {
            let samples = service.rate_history(&from, &to, start, end).await?;
            println!("{}", cli::history_table(&from, &to, &samples));
            Ok(())
        }
        AppCommand::Watch => {
            let interval = config.cache.refresh_interval();
            let (stop_tx, stop_rx) = watch::channel(false);
            let refresher = refresh::spawn_refresh_loop(Arc::clone(service), interval, stop_rx);

            info!(?interval, "Refreshing rates until interrupted");
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for shutdown signal")?;

            let _ = stop_tx.send(true);
            refresher.await.context("Refresh loop panicked")?;
            Ok(())
        }
    }
}
