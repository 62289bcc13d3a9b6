//! Fetch operations
//!
//! Drive one fetch per call through the store's dispatch path and apply the
//! domain's fallback policy when the source fails.

use super::{fallback, FetchError, NewsSource, PriceSource, WeatherSource};
use crate::state::{CryptoAction, Domain, NewsAction, WeatherAction};
use crate::store::Store;
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// What to do when a source fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Log the cause and resolve with synthesized data
    #[default]
    Synthesize,
    /// Reject the fetch with the error message
    Surface,
}

/// Per-domain fallback policies and the weather fan-out pacing
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    pub crypto: FallbackPolicy,
    pub weather: FallbackPolicy,
    pub news: FallbackPolicy,
    /// Pause between cities during a weather refresh
    pub city_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            crypto: FallbackPolicy::Synthesize,
            weather: FallbackPolicy::Synthesize,
            news: FallbackPolicy::Synthesize,
            city_delay: Duration::from_millis(300),
        }
    }
}

/// How a fetch resolved
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Source answered; its data was applied
    Live,
    /// Source failed; synthesized data was applied
    Fallback,
    /// Source failed; the error was recorded on the slice
    Failed(String),
}

impl FetchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }
}

/// The data sources behind each polled domain
#[derive(Clone)]
pub struct Sources {
    pub prices: Arc<dyn PriceSource>,
    pub weather: Arc<dyn WeatherSource>,
    pub news: Arc<dyn NewsSource>,
}

impl Sources {
    pub fn new(
        prices: Arc<dyn PriceSource>,
        weather: Arc<dyn WeatherSource>,
        news: Arc<dyn NewsSource>,
    ) -> Self {
        Self {
            prices,
            weather,
            news,
        }
    }
}

/// Runs fetch operations against a shared store
#[derive(Clone)]
pub struct Fetcher {
    store: Arc<Store>,
    sources: Sources,
    policy: FetchPolicy,
}

impl Fetcher {
    pub fn new(store: Arc<Store>, sources: Sources, policy: FetchPolicy) -> Self {
        Self {
            store,
            sources,
            policy,
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Fetch the market list
    pub async fn fetch_crypto(&self) -> FetchOutcome {
        self.store.dispatch(CryptoAction::FetchPending);

        match self.sources.prices.markets().await {
            Ok(payload) => {
                self.store.dispatch(CryptoAction::FetchFulfilled(payload));
                FetchOutcome::Live
            }
            Err(e) => match self.policy.crypto {
                FallbackPolicy::Synthesize => {
                    tracing::warn!(error = %e, "Price service failed, using fallback data");
                    let payload = fallback::crypto_payload(&mut rand::thread_rng());
                    self.store.dispatch(CryptoAction::FetchFulfilled(payload));
                    FetchOutcome::Fallback
                }
                FallbackPolicy::Surface => self.reject(CryptoAction::FetchRejected, &e),
            },
        }
    }

    /// Fetch the drill-down for one coin
    ///
    /// Failures always resolve with a degraded detail.
    pub async fn fetch_crypto_details(&self, id: &str) -> FetchOutcome {
        self.store.dispatch(CryptoAction::DetailsPending { id: id.to_string() });

        match self.sources.prices.details(id).await {
            Ok(details) => {
                self.store.dispatch(CryptoAction::DetailsFulfilled(details));
                FetchOutcome::Live
            }
            Err(e) => {
                tracing::warn!(coin = %id, error = %e, "Coin details unavailable, using fallback data");
                let details = fallback::crypto_details(id, Utc::now(), &mut rand::thread_rng());
                self.store.dispatch(CryptoAction::DetailsFulfilled(details));
                FetchOutcome::Fallback
            }
        }
    }

    /// Fetch current conditions for one city
    pub async fn fetch_weather(&self, city: &str) -> FetchOutcome {
        self.store.dispatch(WeatherAction::FetchPending { city: city.to_string() });

        match self.sources.weather.current(city).await {
            Ok(snapshot) => {
                self.store.dispatch(WeatherAction::FetchFulfilled {
                    city: city.to_string(),
                    snapshot,
                });
                FetchOutcome::Live
            }
            Err(e) => match self.policy.weather {
                FallbackPolicy::Synthesize => {
                    tracing::warn!(city = %city, error = %e, "Weather source failed, using fallback data");
                    let month0 = Utc::now().month0();
                    let snapshot = fallback::weather_snapshot(city, month0, &mut rand::thread_rng());
                    self.store.dispatch(WeatherAction::FetchFulfilled {
                        city: city.to_string(),
                        snapshot,
                    });
                    FetchOutcome::Fallback
                }
                FallbackPolicy::Surface => {
                    let message = e.to_string();
                    tracing::warn!(city = %city, error = %message, "Weather fetch failed");
                    self.store.dispatch(WeatherAction::FetchRejected {
                        city: city.to_string(),
                        message: message.clone(),
                    });
                    FetchOutcome::Failed(message)
                }
            },
        }
    }

    /// Fetch the 7-day history for one city
    ///
    /// Failures always resolve with synthesized history.
    pub async fn fetch_weather_history(&self, city: &str) -> FetchOutcome {
        self.store.dispatch(WeatherAction::HistoryPending { city: city.to_string() });

        let (history, outcome) = match self.sources.weather.history(city).await {
            Ok(history) => (history, FetchOutcome::Live),
            Err(e) => {
                tracing::warn!(city = %city, error = %e, "Weather history unavailable, using fallback data");
                let history = fallback::weather_history(city, Utc::now(), &mut rand::thread_rng());
                (history, FetchOutcome::Fallback)
            }
        };

        self.store.dispatch(WeatherAction::HistoryFulfilled {
            city: city.to_string(),
            history,
        });
        outcome
    }

    /// Refresh every tracked city, one after another
    ///
    /// A failed city is logged and skipped. The slice is stamped when the
    /// pass completes.
    pub async fn refresh_all_weather(&self) -> Vec<(String, FetchOutcome)> {
        let cities = self.store.read(|s| s.weather.city_ids());
        let mut outcomes = Vec::with_capacity(cities.len());

        for city in cities {
            let outcome = self.fetch_weather(&city).await;
            if let FetchOutcome::Failed(message) = &outcome {
                tracing::warn!(city = %city, error = %message, "Skipping city during weather refresh");
            }
            outcomes.push((city, outcome));

            if !self.policy.city_delay.is_zero() {
                tokio::time::sleep(self.policy.city_delay).await;
            }
        }

        self.store.dispatch(WeatherAction::RefreshAllFulfilled);
        tracing::debug!(cities = outcomes.len(), "Weather refresh complete");
        outcomes
    }

    /// Fetch the headline list
    pub async fn fetch_news(&self) -> FetchOutcome {
        self.store.dispatch(NewsAction::FetchPending);

        match self.sources.news.headlines().await {
            Ok(items) => {
                self.store.dispatch(NewsAction::FetchFulfilled(items));
                FetchOutcome::Live
            }
            Err(e) => match self.policy.news {
                FallbackPolicy::Synthesize => {
                    tracing::warn!(error = %e, "News source failed, using fallback data");
                    self.store.dispatch(NewsAction::FetchFulfilled(fallback::news()));
                    FetchOutcome::Fallback
                }
                FallbackPolicy::Surface => self.reject(NewsAction::FetchRejected, &e),
            },
        }
    }

    /// Run the periodic refresh for one polled domain
    pub async fn refresh(&self, domain: Domain) {
        match domain {
            Domain::Weather => {
                self.refresh_all_weather().await;
            }
            Domain::Crypto => {
                self.fetch_crypto().await;
            }
            Domain::News => {
                self.fetch_news().await;
            }
            Domain::Notifications => {}
        }
    }

    fn reject<A>(&self, action: impl FnOnce(String) -> A, e: &FetchError) -> FetchOutcome
    where
        A: Into<crate::store::Action>,
    {
        let message = e.to_string();
        tracing::warn!(error = %message, "Fetch failed");
        self.store.dispatch(action(message.clone()));
        FetchOutcome::Failed(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{SimulatedNews, SimulatedWeather};
    use crate::prefs::Preferences;
    use crate::state::{CryptoAsset, CryptoDetails, CryptoPayload, NewsItem, WeatherHistoryPoint, WeatherSnapshot};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct DownPrices;

    #[async_trait]
    impl PriceSource for DownPrices {
        async fn markets(&self) -> Result<CryptoPayload, FetchError> {
            Err(FetchError::Timeout)
        }

        async fn details(&self, _id: &str) -> Result<CryptoDetails, FetchError> {
            Err(FetchError::Unavailable)
        }
    }

    struct OneCoin;

    #[async_trait]
    impl PriceSource for OneCoin {
        async fn markets(&self) -> Result<CryptoPayload, FetchError> {
            let mut payload = fallback::crypto_payload(&mut rand::thread_rng());
            payload.cryptos = vec![CryptoAsset::new("bitcoin", "Bitcoin")];
            payload.crypto_data.retain(|id, _| id == "bitcoin");
            Ok(payload)
        }

        async fn details(&self, id: &str) -> Result<CryptoDetails, FetchError> {
            let mut details = fallback::crypto_details(id, Utc::now(), &mut rand::thread_rng());
            details.degraded = false;
            Ok(details)
        }
    }

    /// Fails for one city, counts every call
    struct FlakyWeather {
        failing: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherSource for FlakyWeather {
        async fn current(&self, city: &str) -> Result<WeatherSnapshot, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if city == self.failing {
                return Err(FetchError::Source(format!(
                    "Failed to generate weather data for {}",
                    city
                )));
            }
            SimulatedWeather.current(city).await
        }

        async fn history(&self, _city: &str) -> Result<Vec<WeatherHistoryPoint>, FetchError> {
            Err(FetchError::Unavailable)
        }
    }

    struct DownNews;

    #[async_trait]
    impl NewsSource for DownNews {
        async fn headlines(&self) -> Result<Vec<NewsItem>, FetchError> {
            Err(FetchError::Api {
                status: 503,
                message: "maintenance".into(),
            })
        }
    }

    fn fetcher(
        prices: Arc<dyn PriceSource>,
        weather: Arc<dyn WeatherSource>,
        news: Arc<dyn NewsSource>,
        policy: FetchPolicy,
    ) -> Fetcher {
        let store = Arc::new(Store::new(Preferences::unavailable()));
        Fetcher::new(store, Sources::new(prices, weather, news), policy)
    }

    fn quick_policy() -> FetchPolicy {
        FetchPolicy {
            city_delay: Duration::ZERO,
            ..FetchPolicy::default()
        }
    }

    #[tokio::test]
    async fn test_crypto_fallback_resolves_with_data() {
        let f = fetcher(
            Arc::new(DownPrices),
            Arc::new(SimulatedWeather),
            Arc::new(SimulatedNews::new(Duration::ZERO)),
            quick_policy(),
        );

        let outcome = f.fetch_crypto().await;

        assert_eq!(outcome, FetchOutcome::Fallback);
        let crypto = f.store().read(|s| s.crypto.clone());
        assert_eq!(crypto.crypto_data.len(), 3);
        assert!(crypto.meta.error.is_none());
        assert!(!crypto.meta.loading);
        assert!(crypto.meta.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_crypto_surface_policy_rejects() {
        let policy = FetchPolicy {
            crypto: FallbackPolicy::Surface,
            ..quick_policy()
        };
        let f = fetcher(
            Arc::new(DownPrices),
            Arc::new(SimulatedWeather),
            Arc::new(SimulatedNews::new(Duration::ZERO)),
            policy,
        );

        let outcome = f.fetch_crypto().await;

        assert_eq!(outcome, FetchOutcome::Failed("Request timeout".into()));
        let crypto = f.store().read(|s| s.crypto.clone());
        assert_eq!(crypto.meta.error.as_deref(), Some("Request timeout"));
        assert!(crypto.crypto_data.is_empty());
        assert!(crypto.meta.last_updated.is_none());
    }

    #[tokio::test]
    async fn test_live_crypto_replaces_reference() {
        let f = fetcher(
            Arc::new(OneCoin),
            Arc::new(SimulatedWeather),
            Arc::new(SimulatedNews::new(Duration::ZERO)),
            quick_policy(),
        );

        assert_eq!(f.fetch_crypto().await, FetchOutcome::Live);
        let ids = f.store().read(|s| s.crypto.cryptos.iter().map(|c| c.id.clone()).collect::<Vec<_>>());
        assert_eq!(ids, vec!["bitcoin"]);
    }

    #[tokio::test]
    async fn test_details_fallback_is_degraded() {
        let f = fetcher(
            Arc::new(DownPrices),
            Arc::new(SimulatedWeather),
            Arc::new(SimulatedNews::new(Duration::ZERO)),
            quick_policy(),
        );

        assert_eq!(f.fetch_crypto_details("solana").await, FetchOutcome::Fallback);

        let crypto = f.store().read(|s| s.crypto.clone());
        let selected = crypto.selected.unwrap();
        assert_eq!(selected.name, "Solana");
        assert!(selected.degraded);
        assert!(!crypto.detail_loading);
    }

    #[tokio::test]
    async fn test_refresh_all_weather_continues_past_failure() {
        let weather = Arc::new(FlakyWeather {
            failing: "London",
            calls: AtomicUsize::new(0),
        });
        let policy = FetchPolicy {
            weather: FallbackPolicy::Surface,
            ..quick_policy()
        };
        let f = fetcher(
            Arc::new(DownPrices),
            weather.clone(),
            Arc::new(SimulatedNews::new(Duration::ZERO)),
            policy,
        );

        let outcomes = f.refresh_all_weather().await;

        assert_eq!(weather.calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[1].1.is_failed());

        let state = f.store().read(|s| s.weather.clone());
        assert!(state.snapshot("New York").is_some());
        assert!(state.snapshot("London").is_none());
        assert!(state.snapshot("Tokyo").is_some());
        assert!(state.meta.last_updated.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_all_weather_is_paced() {
        let f = fetcher(
            Arc::new(DownPrices),
            Arc::new(SimulatedWeather),
            Arc::new(SimulatedNews::new(Duration::ZERO)),
            FetchPolicy::default(),
        );
        let started = tokio::time::Instant::now();

        f.refresh_all_weather().await;

        assert!(started.elapsed() >= Duration::from_millis(900));
        assert_eq!(f.store().read(|s| s.weather.weather_data.len()), 3);
    }

    #[tokio::test]
    async fn test_weather_history_fallback() {
        let f = fetcher(
            Arc::new(DownPrices),
            Arc::new(FlakyWeather {
                failing: "",
                calls: AtomicUsize::new(0),
            }),
            Arc::new(SimulatedNews::new(Duration::ZERO)),
            quick_policy(),
        );

        assert_eq!(f.fetch_weather_history("Tokyo").await, FetchOutcome::Fallback);

        let weather = f.store().read(|s| s.weather.clone());
        assert_eq!(weather.weather_history.len(), 7);
        assert_eq!(weather.history_city.as_deref(), Some("Tokyo"));
    }

    #[tokio::test]
    async fn test_news_fallback_resolves_with_data() {
        let f = fetcher(
            Arc::new(DownPrices),
            Arc::new(SimulatedWeather),
            Arc::new(DownNews),
            quick_policy(),
        );

        assert_eq!(f.fetch_news().await, FetchOutcome::Fallback);

        let news = f.store().read(|s| s.news.clone());
        assert!(news.meta.error.is_none());
        assert_eq!(news.news.len(), 6);
        assert!(news.meta.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_news_surface_policy_records_error() {
        let policy = FetchPolicy {
            news: FallbackPolicy::Surface,
            ..quick_policy()
        };
        let f = fetcher(
            Arc::new(DownPrices),
            Arc::new(SimulatedWeather),
            Arc::new(DownNews),
            policy,
        );

        let outcome = f.fetch_news().await;

        assert!(outcome.is_failed());
        let news = f.store().read(|s| s.news.clone());
        assert_eq!(news.meta.error.as_deref(), Some("API responded with status: 503"));
        assert!(news.news.is_empty());
    }

    #[tokio::test]
    async fn test_news_live() {
        let f = fetcher(
            Arc::new(DownPrices),
            Arc::new(SimulatedWeather),
            Arc::new(SimulatedNews::new(Duration::ZERO)),
            quick_policy(),
        );

        assert_eq!(f.fetch_news().await, FetchOutcome::Live);
        assert_eq!(f.store().read(|s| s.news.news.len()), 6);
    }
}
