//! Notification Listener
//!
//! Background tasks that create notifications through the store: one
//! consuming the live price feed, one raising simulated weather alerts.

use super::alerts::{self, PriceAlerter};
use super::feed::{PriceFeed, DEFAULT_FEED_URL};
use crate::state::NotificationAction;
use crate::store::Store;
use chrono::Utc;
use rand::Rng;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Connect to the live price feed
    pub feed_enabled: bool,
    pub feed_url: String,
    /// Chance that a price tick raises an alert
    pub price_alert_probability: f64,
    /// Chance that a weather timer tick raises an alert
    pub weather_alert_probability: f64,
    /// Weather timer period; drawn once from [30 s, 60 s) when unset
    pub weather_period: Option<Duration>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            feed_enabled: true,
            feed_url: DEFAULT_FEED_URL.to_string(),
            price_alert_probability: 0.3,
            weather_alert_probability: 0.3,
            weather_period: None,
        }
    }
}

pub struct NotificationListener {
    store: Arc<Store>,
    config: ListenerConfig,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NotificationListener {
    pub fn new(store: Arc<Store>, config: ListenerConfig) -> Self {
        Self {
            store,
            config,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Spawn the feed and weather tasks, replacing any running ones
    pub fn start(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }

        if self.config.feed_enabled {
            tasks.push(self.spawn_price_feed());
        }
        tasks.push(self.spawn_weather_alerts());
    }

    /// Abort both tasks; safe to call repeatedly
    pub fn stop(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        !self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    fn spawn_price_feed(&self) -> JoinHandle<()> {
        let store = self.store.clone();
        let feed = PriceFeed::new(self.config.feed_url.clone());
        let mut alerter = PriceAlerter::new(self.config.price_alert_probability);

        tokio::spawn(async move {
            let result = feed
                .run(|update| {
                    let alert = alerter.on_update(&update, &mut rand::thread_rng(), Utc::now());
                    if let Some(notification) = alert {
                        tracing::info!(title = %notification.title, "Price alert");
                        store.dispatch(NotificationAction::Add(notification));
                    }
                })
                .await;

            if let Err(e) = result {
                tracing::error!(url = %feed.url(), error = %e, "Price feed stopped");
            }
        })
    }

    fn spawn_weather_alerts(&self) -> JoinHandle<()> {
        let store = self.store.clone();
        let probability = self.config.weather_alert_probability;
        let period = self
            .config
            .weather_period
            .unwrap_or_else(|| Duration::from_millis(rand::thread_rng().gen_range(30_000..60_000)));

        tracing::debug!(period_secs = period.as_secs(), "Weather alert timer started");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let alert = alerts::random_weather_alert(probability, &mut rand::thread_rng(), Utc::now());
                if let Some(notification) = alert {
                    tracing::info!(title = %notification.title, "Weather alert");
                    store.dispatch(NotificationAction::Add(notification));
                }
            }
        })
    }
}

impl Drop for NotificationListener {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::Preferences;
    use crate::state::NotificationKind;

    fn listener(probability: f64) -> (NotificationListener, Arc<Store>) {
        let store = Arc::new(Store::new(Preferences::unavailable()));
        let config = ListenerConfig {
            feed_enabled: false,
            weather_alert_probability: probability,
            weather_period: Some(Duration::from_secs(30)),
            ..ListenerConfig::default()
        };
        (NotificationListener::new(store.clone(), config), store)
    }

    #[test]
    fn test_default_config() {
        let config = ListenerConfig::default();
        assert_eq!(config.feed_url, "wss://ws.coincap.io/prices?assets=bitcoin,ethereum");
        assert_eq!(config.price_alert_probability, 0.3);
        assert!(config.weather_period.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_weather_alerts_fire_on_period() {
        let (listener, store) = listener(1.0);
        listener.start();

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(store.read(|s| s.notifications.notifications.is_empty()));

        tokio::time::sleep(Duration::from_secs(2)).await;
        let notifications = store.read(|s| s.notifications.notifications.clone());
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::WeatherAlert);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.read(|s| s.notifications.notifications.len()), 2);

        listener.stop();
        assert!(!listener.is_running());
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(store.read(|s| s.notifications.notifications.len()), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_probability_is_silent() {
        let (listener, store) = listener(0.0);
        listener.start();

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert!(store.read(|s| s.notifications.notifications.is_empty()));
    }
}
