//! Read-only views derived from the state tree.

use crate::state::{CryptoAsset, Notification, PriceSnapshot, WeatherSnapshot};
use crate::store::AppState;
use serde::Serialize;

/// A favorite coin with its latest market data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteCrypto<'a> {
    pub asset: &'a CryptoAsset,
    pub price: Option<&'a PriceSnapshot>,
}

/// A favorite city with its latest conditions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FavoriteCity<'a> {
    pub city: &'a str,
    pub weather: Option<&'a WeatherSnapshot>,
}

/// Favorite coins in favorite order
pub fn favorite_cryptos(state: &AppState) -> Vec<FavoriteCrypto<'_>> {
    state
        .crypto
        .favorites
        .iter()
        .filter_map(|id| {
            let asset = state.crypto.find(id)?;
            Some(FavoriteCrypto {
                asset,
                price: state.crypto.snapshot(id),
            })
        })
        .collect()
}

/// Favorite cities in favorite order
pub fn favorite_cities(state: &AppState) -> Vec<FavoriteCity<'_>> {
    state
        .weather
        .favorites
        .iter()
        .map(|city| FavoriteCity {
            city: city.as_str(),
            weather: state.weather.snapshot(city),
        })
        .collect()
}

pub fn unread_notifications(state: &AppState) -> Vec<&Notification> {
    state
        .notifications
        .notifications
        .iter()
        .filter(|n| !n.read)
        .collect()
}
