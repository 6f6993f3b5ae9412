//! Composite provider that routes by the catalog class of the base
//! currency. Pure dispatch: normalization stays inside the adapters,
//! and a selected adapter's failure propagates unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::catalog::Catalog;
use crate::error::RateError;
use crate::rate::{RateProvider, RateRecord};

pub struct ProviderRouter {
    fiat: Arc<dyn RateProvider>,
    crypto: Arc<dyn RateProvider>,
    catalog: Arc<Catalog>,
}

impl ProviderRouter {
    pub fn new(
        fiat: Arc<dyn RateProvider>,
        crypto: Arc<dyn RateProvider>,
        catalog: Arc<Catalog>,
    ) -> Self {
        ProviderRouter {
            fiat,
            crypto,
            catalog,
        }
    }

    fn select(&self, base: &str) -> &Arc<dyn RateProvider> {
        if self.catalog.is_crypto(base) {
            &self.crypto
        } else {
            &self.fiat
        }
    }
}

#[async_trait]
impl RateProvider for ProviderRouter {
    async fn latest_rate(&self, base: &str) -> Result<RateRecord, RateError> {
        self.select(base).latest_rate(base).await
    }

    async fn rate_by_date(
        &self,
        base: &str,
        quote: &str,
        date: NaiveDate,
    ) -> Result<RateRecord, RateError> {
        self.select(base).rate_by_date(base, quote, date).await
    }

    async fn rates_for_range(
        &self,
        base: &str,
        quote: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, RateRecord)>, RateError> {
        self.select(base)
            .rates_for_range(base, quote, start, end)
            .await
    }
}
