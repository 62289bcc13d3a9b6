//! Live price feed
//!
//! WebSocket client for a streaming price channel. Each text frame is a JSON
//! object mapping coin IDs to prices, e.g. `{"bitcoin":"64012.55"}`.

use futures_util::StreamExt;
use std::collections::HashMap;
use thiserror::Error;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};

/// Default streaming endpoint
pub const DEFAULT_FEED_URL: &str = "wss://ws.coincap.io/prices?assets=bitcoin,ethereum";

/// Prices carried by one feed message, keyed by coin ID
pub type PriceUpdate = HashMap<String, f64>;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to connect to price feed: {0}")]
    Connect(#[source] tungstenite::Error),

    #[error("Price feed protocol error: {0}")]
    Protocol(#[source] tungstenite::Error),

    #[error("Malformed price message: {0}")]
    Parse(String),
}

/// Parse a feed message; prices may be JSON strings or numbers
pub fn parse_price_message(text: &str) -> Result<PriceUpdate, FeedError> {
    let raw: HashMap<String, serde_json::Value> =
        serde_json::from_str(text).map_err(|e| FeedError::Parse(e.to_string()))?;

    raw.into_iter()
        .map(|(asset, value)| {
            let price = match &value {
                serde_json::Value::String(s) => s.parse::<f64>().ok(),
                serde_json::Value::Number(n) => n.as_f64(),
                _ => None,
            }
            .ok_or_else(|| FeedError::Parse(format!("{} has non-numeric price {}", asset, value)))?;
            Ok((asset, price))
        })
        .collect()
}

/// One connection to the price channel
#[derive(Debug, Clone)]
pub struct PriceFeed {
    url: String,
}

impl PriceFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connect and hand every parsed update to `on_update` until the server
    /// closes the stream
    ///
    /// Malformed messages are logged and skipped. There is no reconnect.
    pub async fn run<F>(&self, mut on_update: F) -> Result<(), FeedError>
    where
        F: FnMut(PriceUpdate) + Send,
    {
        let (mut stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(FeedError::Connect)?;
        tracing::info!(url = %self.url, "Price feed connected");

        while let Some(result) = stream.next().await {
            match result {
                Ok(Message::Text(text)) => match parse_price_message(text.as_str()) {
                    Ok(update) => on_update(update),
                    Err(e) => tracing::warn!(error = %e, "Error parsing price message"),
                },
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "Price feed close frame");
                    break;
                }
                Ok(_) => {}
                Err(e) => return Err(FeedError::Protocol(e)),
            }
        }

        tracing::info!(url = %self.url, "Price feed closed");
        Ok(())
    }
}
