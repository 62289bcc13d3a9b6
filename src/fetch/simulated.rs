//! Simulated sources
//!
//! Local stand-ins for the weather and news providers. They need no network
//! and produce the same shapes the live providers would.

use super::{fallback, FetchError, NewsSource, WeatherSource};
use crate::state::{NewsItem, WeatherHistoryPoint, WeatherSnapshot};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use std::time::Duration;

/// Weather generated from the city and the current season
#[derive(Debug, Clone, Default)]
pub struct SimulatedWeather;

impl SimulatedWeather {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WeatherSource for SimulatedWeather {
    async fn current(&self, city: &str) -> Result<WeatherSnapshot, FetchError> {
        tracing::debug!(city = %city, "Generating weather data");
        let month0 = Utc::now().month0();
        Ok(fallback::weather_snapshot(city, month0, &mut rand::thread_rng()))
    }

    async fn history(&self, city: &str) -> Result<Vec<WeatherHistoryPoint>, FetchError> {
        Ok(fallback::weather_history(city, Utc::now(), &mut rand::thread_rng()))
    }
}

/// Fixed headlines served after an artificial delay
#[derive(Debug, Clone)]
pub struct SimulatedNews {
    delay: Duration,
}

impl SimulatedNews {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SimulatedNews {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[async_trait]
impl NewsSource for SimulatedNews {
    async fn headlines(&self) -> Result<Vec<NewsItem>, FetchError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(fallback::news())
    }
}
