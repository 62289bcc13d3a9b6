//! Store Aggregator
//!
//! Composes the four slices into one state tree behind a single dispatch
//! entry point. Dispatch holds the write lock for the whole reduction and
//! never awaits, so every action is applied atomically with respect to every
//! other. Observers learn about changes through a revision counter published
//! on a `watch` channel and re-read the tree.
//!
//! The store is shared as `Arc<Store>`; there is no global instance.

use crate::prefs::Preferences;
use crate::state::{
    City, CryptoAction, CryptoAsset, CryptoState, Domain, NewsAction, NewsState,
    NotificationAction, NotificationState, ReduceContext, Slice, WeatherAction, WeatherState, DEFAULT_CITIES,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{PoisonError, RwLock};
use tokio::sync::watch;

/// The whole state tree
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppState {
    pub weather: WeatherState,
    pub crypto: CryptoState,
    pub news: NewsState,
    pub notifications: NotificationState,
}

impl AppState {
    /// Boot tree with favorites restored from durable storage
    pub fn restore<S: AsRef<str>>(prefs: &Preferences, cities: &[S]) -> Self {
        Self {
            weather: WeatherState::restore(prefs, cities),
            crypto: CryptoState::restore(prefs),
            news: NewsState::default(),
            notifications: NotificationState::default(),
        }
    }
}

/// Any action the store accepts
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Weather(WeatherAction),
    Crypto(CryptoAction),
    News(NewsAction),
    Notifications(NotificationAction),
}

impl Action {
    /// Slash-separated action type, e.g. `crypto/toggleFavoriteCrypto`
    pub fn name(&self) -> &'static str {
        match self {
            Action::Weather(a) => a.name(),
            Action::Crypto(a) => a.name(),
            Action::News(a) => a.name(),
            Action::Notifications(a) => a.name(),
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            Action::Weather(_) => Domain::Weather,
            Action::Crypto(_) => Domain::Crypto,
            Action::News(_) => Domain::News,
            Action::Notifications(_) => Domain::Notifications,
        }
    }
}

impl From<WeatherAction> for Action {
    fn from(action: WeatherAction) -> Self {
        Action::Weather(action)
    }
}

impl From<CryptoAction> for Action {
    fn from(action: CryptoAction) -> Self {
        Action::Crypto(action)
    }
}

impl From<NewsAction> for Action {
    fn from(action: NewsAction) -> Self {
        Action::News(action)
    }
}

impl From<NotificationAction> for Action {
    fn from(action: NotificationAction) -> Self {
        Action::Notifications(action)
    }
}

/// Single-writer, many-reader state container
#[derive(Debug)]
pub struct Store {
    state: RwLock<AppState>,
    prefs: Preferences,
    revision: watch::Sender<u64>,
}

impl Store {
    /// Store tracking the default cities
    pub fn new(prefs: Preferences) -> Self {
        Self::with_cities(prefs, &DEFAULT_CITIES)
    }

    /// Store tracking the given cities, favorites restored from `prefs`
    pub fn with_cities<S: AsRef<str>>(prefs: Preferences, cities: &[S]) -> Self {
        let state = AppState::restore(&prefs, cities);
        let (revision, _) = watch::channel(0);
        Self {
            state: RwLock::new(state),
            prefs,
            revision,
        }
    }

    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    /// Apply an action now
    pub fn dispatch(&self, action: impl Into<Action>) {
        self.dispatch_at(action, Utc::now());
    }

    /// Apply an action as if at `now`
    pub fn dispatch_at(&self, action: impl Into<Action>, now: DateTime<Utc>) {
        let action = action.into();
        tracing::trace!(action = action.name(), "Dispatch");

        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let ctx = ReduceContext::new(&self.prefs, now);
            match action {
                Action::Weather(a) => state.weather.reduce(a, &ctx),
                Action::Crypto(a) => state.crypto.reduce(a, &ctx),
                Action::News(a) => state.news.reduce(a, &ctx),
                Action::Notifications(a) => state.notifications.reduce(a, &ctx),
            }
        }

        self.revision.send_modify(|r| *r += 1);
    }

    /// Toggle a favorite coin, tracking it first when it is unknown
    ///
    /// Returns whether the coin is a favorite afterwards.
    pub fn toggle_favorite_crypto(&self, id: &str) -> bool {
        if self.read(|s| s.crypto.find(id).is_none()) {
            tracing::info!(coin = %id, "Tracking new coin");
            self.dispatch(CryptoAction::AddCrypto(CryptoAsset::from_id(id)));
        }
        self.dispatch(CryptoAction::ToggleFavorite(id.to_string()));
        self.read(|s| s.crypto.favorites.contains(id))
    }

    /// Toggle a favorite city, tracking it first when it is unknown
    pub fn toggle_favorite_city(&self, city: &str) -> bool {
        if self.read(|s| s.weather.cities.iter().all(|c| c.id != city)) {
            tracing::info!(city = %city, "Tracking new city");
            self.dispatch(WeatherAction::AddCity(City::named(city)));
        }
        self.dispatch(WeatherAction::ToggleFavorite(city.to_string()));
        self.read(|s| s.weather.favorites.contains(city))
    }

    /// Cloned copy of the whole tree
    pub fn snapshot(&self) -> AppState {
        self.read(AppState::clone)
    }

    /// Run `f` against the current tree without cloning it
    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Receiver that changes after every dispatch
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Number of actions applied so far
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }
}
