//! Rate resolution service: validation, cache-aside lookups and amount
//! conversion on top of the provider router.
//!
//! Lookup order is fixed: validate inputs, try the cache, fall back to
//! the provider on miss, store the fresh record, extract the pair. Two
//! concurrent misses for the same key may both reach the provider;
//! both writes carry equivalent data within one TTL window, so the
//! last writer wins.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::cache::TtlCache;
use crate::catalog::Catalog;
use crate::error::RateError;
use crate::rate::{RateProvider, RateRecord};

/// The rate cache stores shared, immutable records.
pub type RateCache = TtlCache<Arc<RateRecord>>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub rate: f64,
    pub converted: f64,
}

/// Outcome of a dual-date conversion: how the same amount converts at
/// two points in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateComparison {
    pub amount_at_from: f64,
    pub amount_at_to: f64,
    pub from_rate: f64,
    pub to_rate: f64,
    pub rate_difference: f64,
}

/// One resolved rate on one day, as returned by a history query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSample {
    pub date: NaiveDate,
    pub rate: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub refreshed: usize,
    pub failed: usize,
}

pub struct RateService {
    provider: Arc<dyn RateProvider>,
    cache: Arc<RateCache>,
    catalog: Arc<Catalog>,
    ttl: Duration,
    max_historical_days: i64,
}

fn cache_key(base: &str, quote: &str, day: NaiveDate) -> String {
    format!("rate:{base}:{quote}:{}", day.format("%Y-%m-%d"))
}

impl RateService {
    pub fn new(
        provider: Arc<dyn RateProvider>,
        cache: Arc<RateCache>,
        catalog: Arc<Catalog>,
        ttl: Duration,
        max_historical_days: i64,
    ) -> Self {
        RateService {
            provider,
            cache,
            catalog,
            ttl,
            max_historical_days,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    fn validate_currencies(&self, from: &str, to: &str) -> Result<(), RateError> {
        if from.is_empty() {
            return Err(RateError::EmptyCurrency { side: "from" });
        }
        if to.is_empty() {
            return Err(RateError::EmptyCurrency { side: "to" });
        }
        if !self.catalog.contains(from) {
            return Err(RateError::UnsupportedCurrency(from.to_string()));
        }
        if !self.catalog.contains(to) {
            return Err(RateError::UnsupportedCurrency(to.to_string()));
        }
        Ok(())
    }

    fn validate_date(&self, date: NaiveDate) -> Result<(), RateError> {
        let today = Utc::now().date_naive();
        if date > today {
            return Err(RateError::FutureDate);
        }
        let horizon = u64::try_from(self.max_historical_days).unwrap_or(0);
        let oldest = today - chrono::Days::new(horizon);
        if date < oldest {
            return Err(RateError::DateTooOld {
                max_days: self.max_historical_days,
            });
        }
        Ok(())
    }

    /// Cache read for one pair/day. A hit whose table lacks the quote
    /// counts as a miss.
    async fn cached_rate(&self, from: &str, to: &str, day: NaiveDate) -> Option<f64> {
        let record = self.cache.get(&cache_key(from, to, day)).await?;
        record.rate_to(to)
    }

    /// Stores under the requested base, not the upstream-echoed
    /// `record.base`, so lookups and writes always agree on the key.
    async fn store_record(&self, base: &str, record: &Arc<RateRecord>, quote: &str, day: NaiveDate) {
        self.cache
            .set(cache_key(base, quote, day), Arc::clone(record), self.ttl)
            .await;
    }

    pub async fn get_latest_rate(&self, from: &str, to: &str) -> Result<f64, RateError> {
        self.validate_currencies(from, to)?;
        let today = Utc::now().date_naive();

        if let Some(rate) = self.cached_rate(from, to, today).await {
            info!(from, to, "Cache hit for latest rate");
            return Ok(rate);
        }

        let record = Arc::new(self.provider.latest_rate(from).await?);
        self.store_record(from, &record, to, today).await;
        record
            .rate_to(to)
            .ok_or_else(|| RateError::pair_not_found(from, to, None))
    }

    pub async fn get_historical_rate(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<f64, RateError> {
        self.validate_currencies(from, to)?;
        self.validate_date(date)?;

        if let Some(rate) = self.cached_rate(from, to, date).await {
            info!(from, to, date = %date, "Cache hit for historical rate");
            return Ok(rate);
        }

        let record = Arc::new(self.provider.rate_by_date(from, to, date).await?);
        self.store_record(from, &record, to, date).await;
        record
            .rate_to(to)
            .ok_or_else(|| RateError::pair_not_found(from, to, Some(date)))
    }

    /// `None` is the "latest" sentinel; any concrete date routes to the
    /// historical lookup. This single branch is the only date-routing
    /// policy.
    pub async fn resolve_rate_by_date(
        &self,
        from: &str,
        to: &str,
        date: Option<NaiveDate>,
    ) -> Result<f64, RateError> {
        match date {
            None => self.get_latest_rate(from, to).await,
            Some(d) => self.get_historical_rate(from, to, d).await,
        }
    }

    pub async fn convert_amount(
        &self,
        from: &str,
        to: &str,
        amount: f64,
        date: Option<NaiveDate>,
    ) -> Result<Conversion, RateError> {
        if amount <= 0.0 {
            return Err(RateError::NonPositiveAmount);
        }
        let rate = self.resolve_rate_by_date(from, to, date).await?;
        Ok(Conversion {
            rate,
            converted: amount * rate,
        })
    }

    /// One rate per day over `[start, end]`, straight from the
    /// provider's day-at-a-time range fetch. Days the provider skipped,
    /// or whose record lacks the quote, are left out of the result.
    pub async fn rate_history(
        &self,
        from: &str,
        to: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RateSample>, RateError> {
        self.validate_currencies(from, to)?;
        self.validate_date(start)?;
        self.validate_date(end)?;
        if start > end {
            return Err(RateError::InvalidDateRange);
        }

        let records = self.provider.rates_for_range(from, to, start, end).await?;
        let mut samples = Vec::with_capacity(records.len());
        for (date, record) in records {
            match record.rate_to(to) {
                Some(rate) => samples.push(RateSample { date, rate }),
                None => warn!(from, to, date = %date, "Range record lacks the quote"),
            }
        }
        Ok(samples)
    }

    /// Resolves two independent rates for two dates and reports both
    /// converted amounts plus the rate movement between them.
    pub async fn compare_conversions(
        &self,
        from: &str,
        to: &str,
        amount: f64,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
    ) -> Result<RateComparison, RateError> {
        if amount <= 0.0 {
            return Err(RateError::NonPositiveAmount);
        }
        let from_rate = self.resolve_rate_by_date(from, to, from_date).await?;
        let to_rate = self.resolve_rate_by_date(from, to, to_date).await?;
        Ok(RateComparison {
            amount_at_from: amount * from_rate,
            amount_at_to: amount * to_rate,
            from_rate,
            to_rate,
            rate_difference: to_rate - from_rate,
        })
    }

    /// Re-primes the cache with the latest table for every catalog
    /// currency. One task per currency, joined to completion; a failing
    /// currency is logged and counted, never aborts the sweep.
    pub async fn refresh_rates(self: &Arc<Self>) -> RefreshSummary {
        info!("Starting rate refresh for all supported currencies");
        let mut tasks = JoinSet::new();
        for code in self.catalog.codes() {
            let service = Arc::clone(self);
            tasks.spawn(async move { (code, service.provider.latest_rate(code).await) });
        }

        let today = Utc::now().date_naive();
        let mut summary = RefreshSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((code, Ok(record))) => {
                    let record = Arc::new(record);
                    for quote in self.catalog.codes() {
                        // Table keys outside the catalog are ignored.
                        if record.rates.contains_key(quote) {
                            self.store_record(code, &record, quote, today).await;
                        }
                    }
                    info!(currency = code, "Refreshed rate table");
                    summary.refreshed += 1;
                }
                Ok((code, Err(e))) => {
                    error!("Failed to refresh rate for {code}: {e}");
                    summary.failed += 1;
                }
                Err(e) => {
                    error!("Refresh task panicked: {e}");
                    summary.failed += 1;
                }
            }
        }
        info!(
            refreshed = summary.refreshed,
            failed = summary.failed,
            "Rate refresh completed"
        );
        summary
    }
}
