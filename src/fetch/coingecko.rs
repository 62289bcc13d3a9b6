//! CoinGecko REST API Client
//!
//! HTTP client for the public price service. Every request is bounded by the
//! configured timeout.

use super::{FetchError, PriceSource};
use crate::state::{CryptoAsset, CryptoDetails, CryptoPayload, PricePoint, PriceSnapshot};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// CoinGecko API client
pub struct CoinGeckoClient {
    client: Client,
    config: PriceServiceConfig,
}

/// Configuration for the price service client
#[derive(Debug, Clone)]
pub struct PriceServiceConfig {
    /// Base URL including the API version, e.g. "https://api.coingecko.com/api/v3"
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Coins requested per market list
    pub per_page: u32,
    /// Leading coins kept as the reference collection
    pub tracked: usize,
}

impl Default for PriceServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            request_timeout_ms: 5000,
            per_page: 10,
            tracked: 3,
        }
    }
}

impl CoinGeckoClient {
    /// Create a new client with the given configuration
    pub fn new(config: PriceServiceConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the current configuration
    pub fn config(&self) -> &PriceServiceConfig {
        &self.config
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FetchError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let body = response.text().await.map_err(FetchError::from_reqwest)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch the market list, normalized to the crypto slice shape
    pub async fn fetch_markets(&self) -> Result<CryptoPayload, FetchError> {
        let url = format!(
            "{}/coins/markets?vs_currency=usd&order=market_cap_desc&per_page={}&page=1&sparkline=false",
            self.base_url(),
            self.config.per_page
        );

        let entries: Vec<MarketEntry> = self.get_json(&url).await?;
        tracing::debug!(coins = entries.len(), "Fetched market list");

        Ok(normalize_markets(entries, self.config.tracked))
    }

    /// Fetch detail and daily price history for one coin
    pub async fn fetch_details(&self, id: &str) -> Result<CryptoDetails, FetchError> {
        let id = urlencoding::encode(id);
        let detail_url = format!(
            "{}/coins/{}?localization=false&tickers=false&market_data=true&community_data=false&developer_data=false",
            self.base_url(),
            id
        );
        let detail: CoinDetailResponse = self.get_json(&detail_url).await?;

        let chart_url = format!(
            "{}/coins/{}/market_chart?vs_currency=usd&days=7&interval=daily",
            self.base_url(),
            id
        );
        let chart: MarketChartResponse = self.get_json(&chart_url).await?;

        Ok(detail.into_details(chart))
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn markets(&self) -> Result<CryptoPayload, FetchError> {
        self.fetch_markets().await
    }

    async fn details(&self, id: &str) -> Result<CryptoDetails, FetchError> {
        self.fetch_details(id).await
    }
}

fn normalize_markets(entries: Vec<MarketEntry>, tracked: usize) -> CryptoPayload {
    let cryptos = entries
        .iter()
        .take(tracked)
        .map(|e| CryptoAsset::new(e.id.clone(), e.name.clone()))
        .collect();

    let crypto_data = entries
        .into_iter()
        .map(|e| {
            let snapshot = PriceSnapshot {
                id: e.id.clone(),
                name: e.name,
                symbol: e.symbol,
                current_price: e.current_price.unwrap_or_default(),
                market_cap: e.market_cap.unwrap_or_default(),
                total_volume: e.total_volume.unwrap_or_default(),
                price_change_percentage_24h: e.price_change_percentage_24h.unwrap_or_default(),
                circulating_supply: e.circulating_supply.unwrap_or_default(),
                image: e.image,
            };
            (e.id, snapshot)
        })
        .collect();

    CryptoPayload {
        cryptos,
        crypto_data,
    }
}

// ============================================
// Response DTOs
// ============================================

#[derive(Debug, Deserialize)]
struct MarketEntry {
    id: String,
    name: String,
    symbol: String,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    total_volume: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    circulating_supply: Option<f64>,
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoinDetailResponse {
    id: String,
    name: String,
    symbol: String,
    #[serde(default)]
    description: LocalizedText,
    #[serde(default)]
    image: ImageLinks,
    #[serde(default)]
    market_data: MarketData,
}

#[derive(Debug, Default, Deserialize)]
struct LocalizedText {
    #[serde(default)]
    en: String,
}

#[derive(Debug, Default, Deserialize)]
struct ImageLinks {
    large: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MarketData {
    #[serde(default)]
    current_price: HashMap<String, Option<f64>>,
    #[serde(default)]
    market_cap: HashMap<String, Option<f64>>,
    #[serde(default)]
    total_volume: HashMap<String, Option<f64>>,
    price_change_percentage_24h: Option<f64>,
    circulating_supply: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
}

fn usd(values: &HashMap<String, Option<f64>>) -> f64 {
    values.get("usd").copied().flatten().unwrap_or_default()
}

impl CoinDetailResponse {
    fn into_details(self, chart: MarketChartResponse) -> CryptoDetails {
        let market = self.market_data;
        CryptoDetails {
            id: self.id,
            name: self.name,
            symbol: self.symbol,
            description: self.description.en,
            image: self.image.large,
            current_price: usd(&market.current_price),
            market_cap: usd(&market.market_cap),
            total_volume: usd(&market.total_volume),
            price_change_percentage_24h: market.price_change_percentage_24h.unwrap_or_default(),
            circulating_supply: market.circulating_supply.unwrap_or_default(),
            price_history: chart
                .prices
                .into_iter()
                .map(|(timestamp, price)| PricePoint {
                    timestamp: timestamp as i64,
                    price,
                })
                .collect(),
            degraded: false,
        }
    }
}
