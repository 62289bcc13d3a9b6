//! Remote Fetch Operations
//!
//! Data sources for the polled domains and the operations that drive a
//! fetch through the store:
//! - Price service (CoinGecko REST API)
//! - Weather (simulated, season- and city-aware)
//! - News (simulated headline feed)
//!
//! Every operation dispatches `pending`, awaits its source, then dispatches
//! `fulfilled` or `rejected`. When a source fails, the domain's
//! [`FallbackPolicy`] decides between synthesized data from [`fallback`] and
//! surfacing the error.

mod coingecko;
pub mod fallback;
mod ops;
mod simulated;

pub use coingecko::{CoinGeckoClient, PriceServiceConfig};
pub use ops::{FallbackPolicy, FetchOutcome, FetchPolicy, Fetcher, Sources};
pub use simulated::{SimulatedNews, SimulatedWeather};

use crate::state::{CryptoDetails, CryptoPayload, NewsItem, WeatherHistoryPoint, WeatherSnapshot};
use async_trait::async_trait;
use thiserror::Error;

/// Market list and coin drill-down
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Top coins by market cap
    async fn markets(&self) -> Result<CryptoPayload, FetchError>;

    /// Detail and 7-day price history for one coin
    async fn details(&self, id: &str) -> Result<CryptoDetails, FetchError>;
}

/// Per-city weather lookups
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, city: &str) -> Result<WeatherSnapshot, FetchError>;

    /// Seven daily points, oldest first
    async fn history(&self, city: &str) -> Result<Vec<WeatherHistoryPoint>, FetchError>;
}

/// Headline feed
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn headlines(&self) -> Result<Vec<NewsItem>, FetchError>;
}

/// Errors that can occur while fetching remote data
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Service unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API responded with status: {status}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Parse(String),

    #[error("{0}")]
    Source(String),
}

impl FetchError {
    /// Classify a transport error
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Unavailable
        } else {
            FetchError::Request(e)
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(FetchError::Timeout.to_string(), "Request timeout");
        assert_eq!(
            FetchError::Api {
                status: 429,
                message: "slow down".into()
            }
            .to_string(),
            "API responded with status: 429"
        );
        assert_eq!(
            FetchError::Source("Failed to generate weather data for Oslo".into()).to_string(),
            "Failed to generate weather data for Oslo"
        );
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<Vec<String>>("{").unwrap_err();
        assert!(matches!(FetchError::from(err), FetchError::Parse(_)));
    }
}
