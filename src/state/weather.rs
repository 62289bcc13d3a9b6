//! Weather slice
//!
//! Tracked cities, the latest snapshot per city, the drill-down history and
//! the user's favorite cities.

use super::favorites::{add_unique, contains_id, remove_by_id, Entity, Favorites};
use super::meta::FetchMeta;
use super::{ReduceContext, Slice};
use crate::prefs::{Preferences, WEATHER_FAVORITES_KEY};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cities tracked when nothing else is configured
pub const DEFAULT_CITIES: [&str; 3] = ["New York", "London", "Tokyo"];

/// A tracked city; the ID is the name used to query weather for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
}

impl City {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.clone(),
            name,
        }
    }
}

impl Entity for City {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Current conditions for one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Temperature in °C
    pub temp: f64,
    /// Relative humidity, 0-100
    pub humidity: u8,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Condition group, e.g. "Clear", "Clouds", "Rain"
    pub condition: String,
    pub description: String,
    /// Icon code, e.g. "01d"
    pub icon: String,
}

/// One day of the drill-down history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherHistoryPoint {
    /// Unix timestamp in seconds
    pub dt: i64,
    pub temp: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherState {
    pub cities: Vec<City>,
    /// Latest snapshot keyed by city ID
    pub weather_data: HashMap<String, WeatherSnapshot>,
    /// City the history below belongs to
    pub history_city: Option<String>,
    /// Daily history, oldest first
    pub weather_history: Vec<WeatherHistoryPoint>,
    /// History fetch in flight
    pub history_loading: bool,
    pub favorites: Favorites,
    #[serde(flatten)]
    pub meta: FetchMeta,
}

impl Default for WeatherState {
    fn default() -> Self {
        Self::with_cities(&DEFAULT_CITIES)
    }
}

impl WeatherState {
    /// Fresh state tracking the given cities
    pub fn with_cities<S: AsRef<str>>(cities: &[S]) -> Self {
        let mut list = Vec::with_capacity(cities.len());
        for city in cities {
            add_unique(&mut list, City::named(city.as_ref()));
        }

        Self {
            cities: list,
            weather_data: HashMap::new(),
            history_city: None,
            weather_history: Vec::new(),
            history_loading: false,
            favorites: Favorites::default(),
            meta: FetchMeta::default(),
        }
    }

    /// Boot state: configured cities plus favorites restored from storage
    ///
    /// A restored favorite whose city is not configured is tracked again
    /// instead of being dropped.
    pub fn restore<S: AsRef<str>>(prefs: &Preferences, cities: &[S]) -> Self {
        let mut state = Self::with_cities(cities);
        state.favorites = Favorites::from_ids(prefs.load(WEATHER_FAVORITES_KEY, Vec::new()));

        for id in state.favorites.iter() {
            if !contains_id(&state.cities, id) {
                tracing::debug!(city = %id, "Tracking favorite city missing from configuration");
                state.cities.push(City::named(id.as_str()));
            }
        }

        state
    }

    /// IDs of all tracked cities, in display order
    pub fn city_ids(&self) -> Vec<String> {
        self.cities.iter().map(|c| c.id.clone()).collect()
    }

    pub fn snapshot(&self, city: &str) -> Option<&WeatherSnapshot> {
        self.weather_data.get(city)
    }
}

/// Intents handled by the weather slice
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherAction {
    ToggleFavorite(String),
    AddCity(City),
    RemoveCity(String),
    FetchPending { city: String },
    FetchFulfilled { city: String, snapshot: WeatherSnapshot },
    FetchRejected { city: String, message: String },
    HistoryPending { city: String },
    HistoryFulfilled { city: String, history: Vec<WeatherHistoryPoint> },
    HistoryRejected { city: String, message: String },
    /// A sequential refresh over every tracked city finished
    RefreshAllFulfilled,
}

impl WeatherAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToggleFavorite(_) => "weather/toggleFavoriteCity",
            Self::AddCity(_) => "weather/addCity",
            Self::RemoveCity(_) => "weather/removeCity",
            Self::FetchPending { .. } => "weather/fetchWeatherData/pending",
            Self::FetchFulfilled { .. } => "weather/fetchWeatherData/fulfilled",
            Self::FetchRejected { .. } => "weather/fetchWeatherData/rejected",
            Self::HistoryPending { .. } => "weather/fetchWeatherHistory/pending",
            Self::HistoryFulfilled { .. } => "weather/fetchWeatherHistory/fulfilled",
            Self::HistoryRejected { .. } => "weather/fetchWeatherHistory/rejected",
            Self::RefreshAllFulfilled => "weather/refreshAllWeatherData/fulfilled",
        }
    }
}

impl Slice for WeatherState {
    type Action = WeatherAction;

    fn reduce(&mut self, action: WeatherAction, ctx: &ReduceContext<'_>) {
        match action {
            WeatherAction::ToggleFavorite(city) => {
                if self.favorites.contains(&city) {
                    self.favorites.remove(&city);
                } else if contains_id(&self.cities, &city) {
                    self.favorites.insert(city);
                } else {
                    tracing::debug!(city = %city, "Ignoring favorite for untracked city");
                    return;
                }
                self.favorites.persist(ctx.prefs, WEATHER_FAVORITES_KEY);
            }
            WeatherAction::AddCity(city) => {
                add_unique(&mut self.cities, city);
            }
            WeatherAction::RemoveCity(city) => {
                remove_by_id(&mut self.cities, &city);
                if self.favorites.remove(&city) {
                    self.favorites.persist(ctx.prefs, WEATHER_FAVORITES_KEY);
                }
            }
            WeatherAction::FetchPending { .. } => {
                self.meta.begin(self.weather_data.is_empty());
            }
            WeatherAction::FetchFulfilled { city, snapshot } => {
                self.weather_data.insert(city, snapshot);
                self.meta.succeed(ctx.now);
            }
            WeatherAction::FetchRejected { city, message } => {
                tracing::debug!(city = %city, "Weather fetch rejected");
                self.meta.fail(message);
            }
            WeatherAction::HistoryPending { .. } => {
                self.history_loading = true;
                self.meta.error = None;
            }
            WeatherAction::HistoryFulfilled { city, history } => {
                self.history_loading = false;
                self.history_city = Some(city);
                self.weather_history = history;
            }
            WeatherAction::HistoryRejected { city, message } => {
                tracing::debug!(city = %city, "Weather history fetch rejected");
                self.history_loading = false;
                self.meta.error = Some(message);
            }
            WeatherAction::RefreshAllFulfilled => {
                self.meta.stamp(ctx.now);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryBackend;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    fn snapshot(temp: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            temp,
            humidity: 70,
            wind_speed: 4.0,
            condition: "Clouds".to_string(),
            description: "clouds".to_string(),
            icon: "03d".to_string(),
        }
    }

    fn setup() -> (WeatherState, Preferences, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let prefs = Preferences::new(backend.clone());
        (WeatherState::default(), prefs, backend)
    }

    #[test]
    fn test_default_cities() {
        let state = WeatherState::default();
        assert_eq!(state.city_ids(), vec!["New York", "London", "Tokyo"]);
        assert!(state.weather_data.is_empty());
        assert!(state.meta.last_updated.is_none());
    }

    #[test]
    fn test_toggle_favorite_persists() {
        let (mut state, prefs, backend) = setup();
        let ctx = ReduceContext::new(&prefs, Utc::now());

        state.reduce(WeatherAction::ToggleFavorite("London".into()), &ctx);
        assert_eq!(state.favorites, ["London"]);

        state.reduce(WeatherAction::ToggleFavorite("London".into()), &ctx);
        assert!(state.favorites.is_empty());

        assert_eq!(backend.writes_for(WEATHER_FAVORITES_KEY), vec![r#"["London"]"#, "[]"]);
    }

    #[test]
    fn test_toggle_untracked_city_is_ignored() {
        let (mut state, prefs, backend) = setup();
        let ctx = ReduceContext::new(&prefs, Utc::now());

        state.reduce(WeatherAction::ToggleFavorite("Paris".into()), &ctx);

        assert!(state.favorites.is_empty());
        assert!(backend.writes().is_empty());
    }

    #[test]
    fn test_add_city_is_idempotent() {
        let (mut state, prefs, _) = setup();
        let ctx = ReduceContext::new(&prefs, Utc::now());

        state.reduce(WeatherAction::AddCity(City::named("Paris")), &ctx);
        state.reduce(WeatherAction::AddCity(City::named("Paris")), &ctx);

        assert_eq!(state.cities.len(), 4);
        assert_eq!(state.cities[3].id, "Paris");
    }

    #[test]
    fn test_remove_favorite_city() {
        let (mut state, prefs, backend) = setup();
        let ctx = ReduceContext::new(&prefs, Utc::now());

        state.reduce(WeatherAction::ToggleFavorite("Tokyo".into()), &ctx);
        state.reduce(WeatherAction::RemoveCity("Tokyo".into()), &ctx);

        assert!(!contains_id(&state.cities, "Tokyo"));
        assert!(state.favorites.is_empty());
        assert_eq!(backend.writes_for(WEATHER_FAVORITES_KEY), vec![r#"["Tokyo"]"#, "[]"]);
    }

    #[test]
    fn test_remove_non_favorite_does_not_persist() {
        let (mut state, prefs, backend) = setup();
        let ctx = ReduceContext::new(&prefs, Utc::now());

        state.reduce(WeatherAction::RemoveCity("London".into()), &ctx);

        assert_eq!(state.cities.len(), 2);
        assert!(backend.writes().is_empty());
    }

    #[test]
    fn test_cold_then_warm_pending() {
        let (mut state, prefs, _) = setup();
        let ctx = ReduceContext::new(&prefs, Utc::now());

        state.reduce(WeatherAction::FetchPending { city: "London".into() }, &ctx);
        assert!(state.meta.loading);

        state.reduce(
            WeatherAction::FetchFulfilled {
                city: "London".into(),
                snapshot: snapshot(12.0),
            },
            &ctx,
        );
        assert!(!state.meta.loading);
        assert!(state.meta.last_updated.is_some());

        state.reduce(WeatherAction::FetchPending { city: "Tokyo".into() }, &ctx);
        assert!(!state.meta.loading);
    }

    #[test]
    fn test_fulfilled_merges_per_city() {
        let (mut state, prefs, _) = setup();
        let ctx = ReduceContext::new(&prefs, Utc::now());

        for (city, temp) in [("London", 12.0), ("Tokyo", 20.0), ("London", 14.0)] {
            state.reduce(
                WeatherAction::FetchFulfilled {
                    city: city.into(),
                    snapshot: snapshot(temp),
                },
                &ctx,
            );
        }

        assert_eq!(state.weather_data.len(), 2);
        assert_eq!(state.snapshot("London").map(|s| s.temp), Some(14.0));
        assert_eq!(state.snapshot("Tokyo").map(|s| s.temp), Some(20.0));
    }

    #[test]
    fn test_rejected_keeps_last_known_good() {
        let (mut state, prefs, _) = setup();
        let ctx = ReduceContext::new(&prefs, Utc::now());

        state.reduce(
            WeatherAction::FetchFulfilled {
                city: "London".into(),
                snapshot: snapshot(12.0),
            },
            &ctx,
        );
        let updated = state.meta.last_updated;

        state.reduce(WeatherAction::FetchPending { city: "London".into() }, &ctx);
        state.reduce(
            WeatherAction::FetchRejected {
                city: "London".into(),
                message: "Failed to generate weather data for London".into(),
            },
            &ctx,
        );

        assert_eq!(state.snapshot("London").map(|s| s.temp), Some(12.0));
        assert_eq!(
            state.meta.error.as_deref(),
            Some("Failed to generate weather data for London")
        );
        assert_eq!(state.meta.last_updated, updated);
        assert!(!state.meta.loading);
    }

    #[test]
    fn test_refresh_all_stamps_last_updated() {
        let (mut state, prefs, _) = setup();
        let first = Utc::now();
        let later = first + Duration::seconds(60);

        state.reduce(WeatherAction::RefreshAllFulfilled, &ReduceContext::new(&prefs, first));
        state.reduce(WeatherAction::RefreshAllFulfilled, &ReduceContext::new(&prefs, later));

        assert_eq!(state.meta.last_updated, Some(later));
    }

    #[test]
    fn test_history_replaces_list() {
        let (mut state, prefs, _) = setup();
        let ctx = ReduceContext::new(&prefs, Utc::now());
        let point = |dt| WeatherHistoryPoint {
            dt,
            temp: 15.0,
            humidity: 70.0,
        };

        state.reduce(WeatherAction::HistoryPending { city: "London".into() }, &ctx);
        assert!(state.history_loading);

        state.reduce(
            WeatherAction::HistoryFulfilled {
                city: "London".into(),
                history: vec![point(1), point(2)],
            },
            &ctx,
        );

        assert!(!state.history_loading);
        assert_eq!(state.history_city.as_deref(), Some("London"));
        assert_eq!(state.weather_history.len(), 2);
    }

    #[test]
    fn test_history_drill_down_leaves_list_loading_alone() {
        let (mut state, prefs, _) = setup();
        let ctx = ReduceContext::new(&prefs, Utc::now());

        state.reduce(
            WeatherAction::FetchFulfilled {
                city: "London".into(),
                snapshot: snapshot(12.0),
            },
            &ctx,
        );
        state.reduce(WeatherAction::HistoryPending { city: "London".into() }, &ctx);

        assert_eq!(state.weather_data.len(), 1);
        assert!(!state.meta.loading);
        assert!(state.history_loading);

        state.reduce(
            WeatherAction::HistoryRejected {
                city: "London".into(),
                message: "history unavailable".into(),
            },
            &ctx,
        );

        assert!(!state.history_loading);
        assert!(!state.meta.loading);
        assert_eq!(state.meta.error.as_deref(), Some("history unavailable"));
        assert!(state.weather_data.contains_key("London"));
    }

    #[test]
    fn test_restore_tracks_orphan_favorites() {
        let backend = MemoryBackend::new().with_entry(WEATHER_FAVORITES_KEY, r#"["Paris","London"]"#);
        let prefs = Preferences::new(Arc::new(backend));

        let state = WeatherState::restore(&prefs, &DEFAULT_CITIES);

        assert_eq!(state.favorites, ["Paris", "London"]);
        assert_eq!(state.city_ids(), vec!["New York", "London", "Tokyo", "Paris"]);
    }
}
