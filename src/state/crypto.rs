//! Crypto slice
//!
//! The reference list of tracked coins, market snapshots keyed by coin ID,
//! the detail drill-down and the user's favorite coins.

use super::favorites::{add_unique, contains_id, remove_by_id, Entity, Favorites};
use super::meta::FetchMeta;
use super::{ReduceContext, Slice};
use crate::prefs::{Preferences, CRYPTO_FAVORITES_KEY};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A tracked coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoAsset {
    pub id: String,
    pub name: String,
}

impl CryptoAsset {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Asset named after its ID ("cardano" -> "Cardano")
    pub fn from_id(id: &str) -> Self {
        Self::new(id, capitalize(id))
    }
}

impl Entity for CryptoAsset {
    fn id(&self) -> &str {
        &self.id
    }
}

/// The coins tracked before the first successful fetch
pub fn default_cryptos() -> Vec<CryptoAsset> {
    vec![
        CryptoAsset::new("bitcoin", "Bitcoin"),
        CryptoAsset::new("ethereum", "Ethereum"),
        CryptoAsset::new("ripple", "XRP"),
    ]
}

/// Upper-case the first character of an ID
pub fn capitalize(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Market data for one coin, in USD
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub current_price: f64,
    pub market_cap: f64,
    pub total_volume: f64,
    pub price_change_percentage_24h: f64,
    pub circulating_supply: f64,
    pub image: Option<String>,
}

/// One point of a price chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub price: f64,
}

/// Drill-down payload for a single coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoDetails {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub image: Option<String>,
    pub current_price: f64,
    pub market_cap: f64,
    pub total_volume: f64,
    pub price_change_percentage_24h: f64,
    pub circulating_supply: f64,
    /// Daily prices over the last week, oldest first
    pub price_history: Vec<PricePoint>,
    /// Synthesized locally because the price service was unavailable
    #[serde(default)]
    pub degraded: bool,
}

/// Normalized result of a market list fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CryptoPayload {
    /// Reference collection; left alone when empty
    pub cryptos: Vec<CryptoAsset>,
    pub crypto_data: HashMap<String, PriceSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoState {
    pub cryptos: Vec<CryptoAsset>,
    /// Latest market snapshot keyed by coin ID
    pub crypto_data: HashMap<String, PriceSnapshot>,
    pub selected: Option<CryptoDetails>,
    /// Drill-down fetch in flight
    pub detail_loading: bool,
    pub favorites: Favorites,
    #[serde(flatten)]
    pub meta: FetchMeta,
}

impl Default for CryptoState {
    fn default() -> Self {
        Self {
            cryptos: default_cryptos(),
            crypto_data: HashMap::new(),
            selected: None,
            detail_loading: false,
            favorites: Favorites::default(),
            meta: FetchMeta::default(),
        }
    }
}

impl CryptoState {
    /// Boot state with favorites restored from storage
    ///
    /// A restored favorite whose coin is not in the default list is tracked
    /// again instead of being dropped.
    pub fn restore(prefs: &Preferences) -> Self {
        let mut state = Self {
            favorites: Favorites::from_ids(prefs.load(CRYPTO_FAVORITES_KEY, Vec::new())),
            ..Self::default()
        };

        for id in state.favorites.iter() {
            if !contains_id(&state.cryptos, id) {
                tracing::debug!(coin = %id, "Tracking favorite coin missing from defaults");
                state.cryptos.push(CryptoAsset::from_id(id));
            }
        }

        state
    }

    pub fn find(&self, id: &str) -> Option<&CryptoAsset> {
        self.cryptos.iter().find(|c| c.id == id)
    }

    pub fn snapshot(&self, id: &str) -> Option<&PriceSnapshot> {
        self.crypto_data.get(id)
    }

    /// Replace the reference collection, keeping favorited coins tracked
    fn replace_cryptos(&mut self, fetched: Vec<CryptoAsset>) {
        let mut next = fetched;
        for asset in self.cryptos.drain(..) {
            if self.favorites.contains(&asset.id) && !contains_id(&next, &asset.id) {
                next.push(asset);
            }
        }
        self.cryptos = next;
    }
}

/// Intents handled by the crypto slice
#[derive(Debug, Clone, PartialEq)]
pub enum CryptoAction {
    ToggleFavorite(String),
    AddCrypto(CryptoAsset),
    RemoveCrypto(String),
    FetchPending,
    FetchFulfilled(CryptoPayload),
    FetchRejected(String),
    DetailsPending { id: String },
    DetailsFulfilled(CryptoDetails),
    DetailsRejected { id: String, message: String },
}

impl CryptoAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToggleFavorite(_) => "crypto/toggleFavoriteCrypto",
            Self::AddCrypto(_) => "crypto/addCrypto",
            Self::RemoveCrypto(_) => "crypto/removeCrypto",
            Self::FetchPending => "crypto/fetchCryptoData/pending",
            Self::FetchFulfilled(_) => "crypto/fetchCryptoData/fulfilled",
            Self::FetchRejected(_) => "crypto/fetchCryptoData/rejected",
            Self::DetailsPending { .. } => "crypto/fetchCryptoDetails/pending",
            Self::DetailsFulfilled(_) => "crypto/fetchCryptoDetails/fulfilled",
            Self::DetailsRejected { .. } => "crypto/fetchCryptoDetails/rejected",
        }
    }
}

impl Slice for CryptoState {
    type Action = CryptoAction;

    fn reduce(&mut self, action: CryptoAction, ctx: &ReduceContext<'_>) {
        match action {
            CryptoAction::ToggleFavorite(id) => {
                if self.favorites.contains(&id) {
                    self.favorites.remove(&id);
                } else if contains_id(&self.cryptos, &id) {
                    self.favorites.insert(id);
                } else {
                    tracing::debug!(coin = %id, "Ignoring favorite for untracked coin");
                    return;
                }
                self.favorites.persist(ctx.prefs, CRYPTO_FAVORITES_KEY);
            }
            CryptoAction::AddCrypto(asset) => {
                add_unique(&mut self.cryptos, asset);
            }
            CryptoAction::RemoveCrypto(id) => {
                remove_by_id(&mut self.cryptos, &id);
                if self.favorites.remove(&id) {
                    self.favorites.persist(ctx.prefs, CRYPTO_FAVORITES_KEY);
                }
            }
            CryptoAction::FetchPending => {
                self.meta.begin(self.crypto_data.is_empty());
            }
            CryptoAction::FetchFulfilled(payload) => {
                self.crypto_data.extend(payload.crypto_data);
                if !payload.cryptos.is_empty() {
                    self.replace_cryptos(payload.cryptos);
                }
                self.meta.succeed(ctx.now);
            }
            CryptoAction::FetchRejected(message) => {
                self.meta.fail(message);
            }
            CryptoAction::DetailsPending { .. } => {
                self.detail_loading = true;
                self.meta.error = None;
            }
            CryptoAction::DetailsFulfilled(details) => {
                self.detail_loading = false;
                self.selected = Some(details);
            }
            CryptoAction::DetailsRejected { id, message } => {
                tracing::debug!(coin = %id, "Crypto details fetch rejected");
                self.detail_loading = false;
                self.meta.error = Some(message);
            }
        }
    }
}
