//! Domain Slices
//!
//! Four independent state containers, one per data domain. Each slice owns
//! its entities plus the loading/error/freshness flags for that domain and is
//! mutated only by reducing one of its own actions.
//!
//! ## Fetch lifecycle
//!
//! Every polled slice follows the same transitions (see [`FetchMeta`]):
//!
//! - `pending`: error cleared; `loading` set only on a cold load
//! - `fulfilled`: `loading` cleared, payload merged, `last_updated` advanced
//! - `rejected`: `loading` cleared, error recorded, data untouched

pub mod crypto;
pub mod favorites;
pub mod meta;
pub mod news;
pub mod notifications;
pub mod weather;

pub use crypto::{
    default_cryptos, CryptoAction, CryptoAsset, CryptoDetails, CryptoPayload, CryptoState,
    PricePoint, PriceSnapshot,
};
pub use favorites::{Entity, Favorites};
pub use meta::FetchMeta;
pub use news::{NewsAction, NewsItem, NewsState};
pub use notifications::{
    Notification, NotificationAction, NotificationKind, NotificationState, MAX_NOTIFICATIONS,
};
pub use weather::{
    City, WeatherAction, WeatherHistoryPoint, WeatherSnapshot, WeatherState, DEFAULT_CITIES,
};

use crate::prefs::Preferences;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything a reducer may touch besides its own state
#[derive(Debug, Clone, Copy)]
pub struct ReduceContext<'a> {
    /// Durable storage for favorite lists
    pub prefs: &'a Preferences,
    /// Time the action is applied
    pub now: DateTime<Utc>,
}

impl<'a> ReduceContext<'a> {
    pub fn new(prefs: &'a Preferences, now: DateTime<Utc>) -> Self {
        Self { prefs, now }
    }
}

/// A state container mutated by a closed set of actions
///
/// Reduction is synchronous and must not block.
pub trait Slice {
    type Action;

    fn reduce(&mut self, action: Self::Action, ctx: &ReduceContext<'_>);
}

/// The data domains of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Weather,
    Crypto,
    News,
    Notifications,
}

impl Domain {
    /// Domains refreshed by the scheduler
    pub const POLLED: [Domain; 3] = [Domain::Weather, Domain::Crypto, Domain::News];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Weather => "weather",
            Domain::Crypto => "crypto",
            Domain::News => "news",
            Domain::Notifications => "notifications",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
