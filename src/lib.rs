//! # Nexus
//!
//! Client-side state synchronization engine for a dashboard that aggregates
//! cryptocurrency prices, weather conditions and news headlines.
//!
//! ## Features
//!
//! - **Single state tree**: four domain slices behind one dispatch entry point
//! - **Durable favorites**: favorite coins and cities survive restarts
//! - **Graceful degradation**: fetch failures fall back to synthesized data
//! - **Periodic polling**: independent timers per domain plus a single-flight refresh
//! - **Notifications**: live price alerts and simulated weather alerts
//!
//! ## Modules
//!
//! - [`prefs`]: Durable key/value preference storage
//! - [`state`]: Domain slices and their actions
//! - [`store`]: Store aggregator
//! - [`fetch`]: Remote fetch operations and fallback data
//! - [`scheduler`]: Refresh timers
//! - [`notifications`]: Price feed and alert generation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nexus::fetch::{CoinGeckoClient, Fetcher, Sources, SimulatedNews, SimulatedWeather};
//! use nexus::{Config, CryptoAction, RefreshScheduler, Store};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let store = Arc::new(Store::with_cities(config.preferences(), &config.weather.cities));
//!
//!     let sources = Sources::new(
//!         Arc::new(CoinGeckoClient::new(config.price_service())?),
//!         Arc::new(SimulatedWeather::new()),
//!         Arc::new(SimulatedNews::default()),
//!     );
//!     let fetcher = Fetcher::new(store.clone(), sources, config.fetch_policy());
//!
//!     // Fetch everything now, then keep polling
//!     let scheduler = RefreshScheduler::new(fetcher, config.refresh_intervals());
//!     scheduler.start();
//!
//!     store.dispatch(CryptoAction::ToggleFavorite("bitcoin".into()));
//!
//!     let state = store.snapshot();
//!     println!("{} favorite coins", state.crypto.favorites.len());
//!
//!     scheduler.stop();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod fetch;
pub mod notifications;
pub mod prefs;
pub mod scheduler;
pub mod selectors;
pub mod state;
pub mod status;
pub mod store;

// Re-export top-level types for convenience
pub use config::{generate_default_config, Config, ConfigError, LoggingConfig};

pub use prefs::{Preferences, PrefsError, PrefsResult};

pub use state::{
    CryptoAction, Domain, NewsAction, Notification, NotificationAction, NotificationKind,
    WeatherAction,
};

pub use store::{Action, AppState, Store};

pub use fetch::{FallbackPolicy, FetchError, FetchOutcome, FetchPolicy, Fetcher, Sources};

pub use scheduler::{RefreshIntervals, RefreshOutcome, RefreshScheduler};

pub use notifications::{ListenerConfig, NotificationListener};

pub use status::{DataStatus, DomainStatus};
