//! Crypto rate adapter for the coinlayer upstream.
//!
//! Coinlayer only prices symbols against USD. The adapter fetches the
//! USD price table and derives every cross-rate as
//! `priceUSD(base) / priceUSD(quote)`, with `priceUSD(USD) = 1`, so
//! callers always receive a direct base→quote multiplier and never see
//! pivot-denominated spot prices.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::error::RateError;
use crate::rate::{RateProvider, RateRecord};

const PROVIDER: &str = "coinlayer";
const PIVOT: &str = "USD";

pub struct CryptoProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct CoinlayerResponse {
    success: bool,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// Derives the base→x conversion table from a USD price table.
/// Symbols with a zero USD price are left out rather than divided by.
fn normalize_pivot(
    base: &str,
    mut usd_prices: HashMap<String, f64>,
) -> Result<HashMap<String, f64>, RateError> {
    usd_prices.entry(PIVOT.to_string()).or_insert(1.0);

    let base_price = match usd_prices.get(base) {
        Some(&p) if p != 0.0 => p,
        _ => {
            return Err(RateError::PivotPriceUnavailable {
                symbol: base.to_string(),
            });
        }
    };

    let mut table = HashMap::with_capacity(usd_prices.len());
    for (symbol, usd_price) in &usd_prices {
        if *usd_price == 0.0 {
            continue;
        }
        table.insert(symbol.clone(), base_price / usd_price);
    }
    // Identity conversion for the base itself.
    table.insert(base.to_string(), 1.0);
    Ok(table)
}

impl CryptoProvider {
    /// The HTTP client is built once and reused across calls so the
    /// connection pool survives between requests.
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: std::time::Duration,
    ) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .user_agent("fxrate/0.1")
            .timeout(timeout)
            .build()
            .map_err(|source| RateError::Request {
                provider: PROVIDER,
                source,
            })?;
        Ok(CryptoProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    async fn fetch_usd_prices(&self, endpoint: &str) -> Result<HashMap<String, f64>, RateError> {
        let url = format!(
            "{}/{}?access_key={}",
            self.base_url, endpoint, self.api_key
        );
        debug!("Requesting crypto prices from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| RateError::Request {
                provider: PROVIDER,
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| RateError::Request {
            provider: PROVIDER,
            source,
        })?;
        if !status.is_success() {
            return Err(RateError::UpstreamStatus {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CoinlayerResponse =
            serde_json::from_str(&body).map_err(|source| RateError::Malformed {
                provider: PROVIDER,
                source,
            })?;
        if !parsed.success {
            return Err(RateError::Upstream {
                provider: PROVIDER,
                detail: "success=false".to_string(),
            });
        }
        Ok(parsed.rates)
    }
}

#[async_trait]
impl RateProvider for CryptoProvider {
    async fn latest_rate(&self, base: &str) -> Result<RateRecord, RateError> {
        let usd_prices = self.fetch_usd_prices("live").await?;
        let table = normalize_pivot(base, usd_prices)?;
        info!(base, "Fetched latest crypto table (USD pivot)");
        Ok(RateRecord::new(base, table))
    }

    async fn rate_by_date(
        &self,
        base: &str,
        quote: &str,
        date: NaiveDate,
    ) -> Result<RateRecord, RateError> {
        let endpoint = date.format("%Y-%m-%d").to_string();
        let mut usd_prices = self.fetch_usd_prices(&endpoint).await?;
        usd_prices.entry(PIVOT.to_string()).or_insert(1.0);

        // A missing or zero price for the requested quote fails the call.
        match usd_prices.get(quote) {
            Some(&p) if p != 0.0 => {}
            _ => {
                return Err(RateError::PivotPriceUnavailable {
                    symbol: quote.to_string(),
                });
            }
        }

        let table = normalize_pivot(base, usd_prices)?;
        info!(base, quote, date = %date, "Fetched historical crypto table (USD pivot)");
        Ok(RateRecord::new(base, table))
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
                Err(e) => error!(date = %day, "Failed to fetch crypto rate: {e}"),
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        Ok(records)
    }
}
