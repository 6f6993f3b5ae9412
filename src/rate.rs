//! Rate records and the provider capability.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::RateError;

/// One fetched rate table: 1 unit of `base` equals `rates[x]` units of
/// `x` for every `x` present. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct RateRecord {
    pub base: String,
    pub rates: HashMap<String, f64>,
    pub fetched_at: DateTime<Utc>,
}

impl RateRecord {
    pub fn new(base: impl Into<String>, rates: HashMap<String, f64>) -> Self {
        Self {
            base: base.into(),
            rates,
            fetched_at: Utc::now(),
        }
    }

    pub fn rate_to(&self, quote: &str) -> Option<f64> {
        self.rates.get(quote).copied()
    }
}

/// A single upstream source of rate tables. Concrete variants are the
/// fiat adapter, the crypto adapter, the offline mock, and the
/// composite router that dispatches between them.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Current rate table for `base` against every quote the upstream
    /// knows.
    async fn latest_rate(&self, base: &str) -> Result<RateRecord, RateError>;

    /// Rate table for `base` on a specific day.
    async fn rate_by_date(
        &self,
        base: &str,
        quote: &str,
        date: NaiveDate,
    ) -> Result<RateRecord, RateError>;

    /// One record per day in `[start, end]`, fetched a day at a time
    /// and tagged with its day. A failing day is logged and skipped;
    /// the successful subset is returned.
    async fn rates_for_range(
        &self,
        base: &str,
        quote: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, RateRecord)>, RateError>;
}
