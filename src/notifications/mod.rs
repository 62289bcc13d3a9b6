//! Notification Listener
//!
//! Live price alerts from a streaming feed plus simulated weather alerts,
//! delivered as notifications through the store.

pub mod alerts;
mod feed;
mod listener;

pub use alerts::{format_usd, PriceAlerter};
pub use feed::{parse_price_message, FeedError, PriceFeed, PriceUpdate, DEFAULT_FEED_URL};
pub use listener::{ListenerConfig, NotificationListener};
