//! Error taxonomy for rate resolution.
//!
//! Validation errors are returned synchronously and never retried;
//! upstream errors wrap a single failed provider call and leave the
//! retry decision to the caller.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RateError {
    /// A currency code argument was empty.
    #[error("{side} currency is required")]
    EmptyCurrency { side: &'static str },

    /// The currency code is not in the catalog.
    #[error("currency {0} is not supported")]
    UnsupportedCurrency(String),

    #[error("amount must be greater than 0")]
    NonPositiveAmount,

    #[error("date cannot be in the future")]
    FutureDate,

    #[error("date cannot be older than {max_days} days")]
    DateTooOld { max_days: i64 },

    #[error("start date cannot be after end date")]
    InvalidDateRange,

    /// The resolved record carries no rate for the requested pair.
    #[error("conversion rate from {from} to {to} not found{}", fmt_date_suffix(.date))]
    PairNotFound {
        from: String,
        to: String,
        date: Option<NaiveDate>,
    },

    /// The provider call itself failed (connect, timeout, body read).
    #[error("{provider} request failed: {source}")]
    Request {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a non-2xx status.
    #[error("{provider} returned status {status}: {body}")]
    UpstreamStatus {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The provider answered 2xx but the payload did not parse.
    #[error("{provider} response malformed: {source}")]
    Malformed {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The provider signalled failure inside a 2xx payload.
    #[error("{provider} reported failure: {detail}")]
    Upstream {
        provider: &'static str,
        detail: String,
    },

    /// No usable USD price for a symbol in a pivot-normalized table.
    #[error("price in USD for {symbol} not available")]
    PivotPriceUnavailable { symbol: String },
}

fn fmt_date_suffix(date: &Option<NaiveDate>) -> String {
    match date {
        Some(d) => format!(" for date {}", d.format("%Y-%m-%d")),
        None => String::new(),
    }
}

impl RateError {
    pub fn pair_not_found(from: &str, to: &str, date: Option<NaiveDate>) -> Self {
        Self::PairNotFound {
            from: from.to_string(),
            to: to.to_string(),
            date,
        }
    }

    /// True for errors produced by input validation rather than an
    /// upstream call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyCurrency { .. }
                | Self::UnsupportedCurrency(_)
                | Self::NonPositiveAmount
                | Self::FutureDate
                | Self::DateTooOld { .. }
                | Self::InvalidDateRange
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_error_messages() {
        let err = RateError::UnsupportedCurrency("XYZ".to_string());
        assert_eq!(err.to_string(), "currency XYZ is not supported");

        let err = RateError::DateTooOld { max_days: 90 };
        assert_eq!(err.to_string(), "date cannot be older than 90 days");

        let err = RateError::pair_not_found("EUR", "USD", None);
        assert_eq!(err.to_string(), "conversion rate from EUR to USD not found");

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let err = RateError::pair_not_found("EUR", "USD", Some(date));
        assert_eq!(
            err.to_string(),
            "conversion rate from EUR to USD not found for date 2024-03-01"
        );
    }

    #[test]
    fn test_validation_classification() {
        assert!(RateError::NonPositiveAmount.is_validation());
        assert!(RateError::FutureDate.is_validation());
        assert!(RateError::InvalidDateRange.is_validation());
        assert!(
            !RateError::Upstream {
                provider: "coinlayer",
                detail: "success=false".to_string(),
            }
            .is_validation()
        );
    }
}
