//! Fiat rate adapter for the exchangerate-api.com v6 upstream.
//!
//! The upstream already answers with a base/quote conversion table, so
//! this adapter maps the payload straight into a [`RateRecord`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::error::RateError;
use crate::rate::{RateProvider, RateRecord};

const PROVIDER: &str = "exchangerate-api";

pub struct FiatProvider {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl FiatProvider {
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
        Ok(FiatProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
        })
    }

    async fn fetch_table(&self, url: &str) -> Result<FiatRateResponse, RateError> {
        debug!("Requesting fiat rates from {}", url);
        let response = self
            .client
            .get(url)
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

        let parsed: FiatRateResponse =
            serde_json::from_str(&body).map_err(|source| RateError::Malformed {
                provider: PROVIDER,
                source,
            })?;
        if let Some(result) = parsed.result.as_deref()
            && result != "success"
        {
            return Err(RateError::Upstream {
                provider: PROVIDER,
                detail: format!("result={result}"),
            });
        }
        Ok(parsed)
    }
}

#[derive(Debug, Deserialize)]
struct FiatRateResponse {
    result: Option<String>,
    base_code: String,
    conversion_rates: HashMap<String, f64>,
}

#[async_trait]
impl RateProvider for FiatProvider {
    async fn latest_rate(&self, base: &str) -> Result<RateRecord, RateError> {
        let url = format!("{}/{}/latest/{}", self.base_url, self.api_key, base);
        let parsed = self.fetch_table(&url).await?;
        info!(base, "Fetched latest fiat rate table");
        Ok(RateRecord::new(parsed.base_code, parsed.conversion_rates))
    }

    async fn rate_by_date(
        &self,
        base: &str,
        _quote: &str,
        date: NaiveDate,
    ) -> Result<RateRecord, RateError> {
        let url = format!(
            "{}/{}/history/{}/{}",
            self.base_url,
            self.api_key,
            base,
            date.format("%Y/%m/%d")
        );
        let parsed = self.fetch_table(&url).await?;
        info!(base, date = %date, "Fetched historical fiat rate table");
        Ok(RateRecord::new(parsed.base_code, parsed.conversion_rates))
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
                Err(e) => error!(date = %day, "Failed to fetch fiat rate: {e}"),
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(uri: &str) -> FiatProvider {
        FiatProvider::new(uri, "test-key", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_latest_rate_maps_table() {
        let mock_server = MockServer::start().await;
        let mock_response = r#"{
            "result": "success",
            "base_code": "EUR",
            "conversion_rates": {
                "USD": 1.1,
                "GBP": 0.85,
                "EUR": 1.0
            }
        }"#;
        Mock::given(method("GET"))
            .and(path("/test-key/latest/EUR"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        let record = provider(&mock_server.uri()).latest_rate("EUR").await.unwrap();
        assert_eq!(record.base, "EUR");
        assert_eq!(record.rate_to("USD"), Some(1.1));
        assert_eq!(record.rate_to("GBP"), Some(0.85));
    }

    #[tokio::test]
    async fn test_rate_by_date_uses_history_path() {
        let mock_server = MockServer::start().await;
        let mock_response = r#"{
            "result": "success",
            "base_code": "USD",
            "conversion_rates": { "INR": 83.2 }
        }"#;
        Mock::given(method("GET"))
            .and(path("/test-key/history/USD/2024/03/01"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let record = provider(&mock_server.uri())
            .rate_by_date("USD", "INR", date)
            .await
            .unwrap();
        assert_eq!(record.rate_to("INR"), Some(83.2));
    }

    #[tokio::test]
    async fn test_http_error_is_surfaced() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test-key/latest/EUR"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server.uri())
            .latest_rate("EUR")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "exchangerate-api returned status 500: boom"
        );
    }

    #[tokio::test]
    async fn test_malformed_payload() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test-key/latest/EUR"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server.uri())
            .latest_rate("EUR")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exchangerate-api response malformed"));
    }

    #[tokio::test]
    async fn test_upstream_failure_result() {
        let mock_server = MockServer::start().await;
        let mock_response = r#"{
            "result": "error",
            "base_code": "EUR",
            "conversion_rates": {}
        }"#;
        Mock::given(method("GET"))
            .and(path("/test-key/latest/EUR"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server.uri())
            .latest_rate("EUR")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "exchangerate-api reported failure: result=error"
        );
    }

    #[tokio::test]
    async fn test_range_skips_failing_days() {
        let mock_server = MockServer::start().await;
        let ok_body = r#"{
            "result": "success",
            "base_code": "EUR",
            "conversion_rates": { "USD": 1.1 }
        }"#;
        Mock::given(method("GET"))
            .and(path("/test-key/history/EUR/2024/03/01"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ok_body))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/test-key/history/EUR/2024/03/02"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/test-key/history/EUR/2024/03/03"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ok_body))
            .mount(&mock_server)
            .await;

        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        let records = provider(&mock_server.uri())
            .rates_for_range("EUR", "USD", start, end)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, start);
        assert_eq!(records[1].0, end);
        assert_eq!(records[0].1.rate_to("USD"), Some(1.1));
    }

    #[tokio::test]
    async fn test_configured_timeout_applies() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test-key/latest/EUR"))
            .respond_with(
                ResponseTemplate::new(200).set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let provider =
            FiatProvider::new(&mock_server.uri(), "test-key", Duration::from_millis(50)).unwrap();
        let err = provider.latest_rate("EUR").await.unwrap_err();
        assert!(err.to_string().starts_with("exchangerate-api request failed"));
    }
}
