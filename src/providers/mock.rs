//! Deterministic offline provider for tests and disconnected runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use tracing::error;

use crate::catalog::Catalog;
use crate::error::RateError;
use crate::rate::{RateProvider, RateRecord};

pub struct MockProvider {
    catalog: Arc<Catalog>,
}

impl MockProvider {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        MockProvider { catalog }
    }
}

/// Small day-dependent wobble around 0.95 so historical queries return
/// stable but distinguishable values.
fn rate_for_day(date: NaiveDate) -> f64 {
    let key = date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32;
    let variance = f64::from((key % 7) - 3) * 0.005;
    let rate = 0.95 + variance;
    if rate <= 0.0 { 0.9 } else { rate }
}

#[async_trait]
impl RateProvider for MockProvider {
    async fn latest_rate(&self, base: &str) -> Result<RateRecord, RateError> {
        let mut rates: HashMap<String, f64> = self
            .catalog
            .codes()
            .map(|code| (code.to_string(), 1.0))
            .collect();
        rates.insert(base.to_string(), 1.0);
        Ok(RateRecord::new(base, rates))
    }

    async fn rate_by_date(
        &self,
        base: &str,
        quote: &str,
        date: NaiveDate,
    ) -> Result<RateRecord, RateError> {
        let rate = if base == quote { 1.0 } else { rate_for_day(date) };
        let rates = HashMap::from([(quote.to_string(), rate), (base.to_string(), 1.0)]);
        Ok(RateRecord::new(base, rates))
    }

    async fn rates_for_range(
        &self,
        base: &str,
        quote: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, RateRecord)>, RateError> {
        let mut records = Vec::new();
        let mut day = start;
        while day <= end {
            match self.rate_by_date(base, quote, day).await {
                Ok(record) => records.push((day, record)),
                Err(e) => error!(date = %day, "Mock rate failed: {e}"),
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        Ok(records)
    }
}
