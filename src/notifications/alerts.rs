//! Alert builders
//!
//! Turn price ticks and simulated weather events into [`Notification`]s.

use super::feed::PriceUpdate;
use crate::state::{Notification, NotificationKind};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::fmt;

/// Coins that raise price alerts, with display names, in priority order
pub const ALERT_ASSETS: [(&str, &str); 2] = [("bitcoin", "Bitcoin"), ("ethereum", "Ethereum")];

/// Cities that receive simulated weather alerts
pub const ALERT_CITIES: [&str; 3] = ["New York", "London", "Tokyo"];

pub const WEATHER_ALERTS: [&str; 5] = [
    "Heavy rain expected",
    "Temperature dropping rapidly",
    "Strong winds advisory",
    "Heat wave warning",
    "Thunderstorm approaching",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increased,
    Decreased,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Increased => f.write_str("increased"),
            Direction::Decreased => f.write_str("decreased"),
        }
    }
}

/// Format a USD amount with thousands separators and two decimals
///
/// `64000.5` becomes `"64,000.50"`.
pub fn format_usd(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

pub fn price_alert(name: &str, price: f64, direction: Direction, now: DateTime<Utc>) -> Notification {
    Notification::new(
        NotificationKind::PriceAlert,
        format!("{} Price Alert", name),
        format!("{} price has {} to ${}", name, direction, format_usd(price)),
        now,
    )
}

pub fn weather_alert(city: &str, message: &str, now: DateTime<Utc>) -> Notification {
    Notification::new(
        NotificationKind::WeatherAlert,
        format!("Weather Alert: {}", city),
        message,
        now,
    )
}

/// Tracks the last seen price per coin and decides which ticks alert
#[derive(Debug, Clone)]
pub struct PriceAlerter {
    probability: f64,
    last_prices: HashMap<String, f64>,
}

impl PriceAlerter {
    pub fn new(probability: f64) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
            last_prices: HashMap::new(),
        }
    }

    /// Maybe build an alert for one feed message
    ///
    /// Only the first alert asset present in the update is considered. The
    /// direction compares against the previous tick for that coin, or is
    /// drawn at random for the first one.
    pub fn on_update<R: Rng + ?Sized>(
        &mut self,
        update: &PriceUpdate,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Option<Notification> {
        let (id, name, price) = ALERT_ASSETS
            .iter()
            .find_map(|(id, name)| update.get(*id).map(|price| (*id, *name, *price)))?;

        let previous = self.last_prices.insert(id.to_string(), price);
        if !rng.gen_bool(self.probability) {
            return None;
        }

        let direction = match previous {
            Some(prev) if price > prev => Direction::Increased,
            Some(prev) if price < prev => Direction::Decreased,
            _ if rng.gen_bool(0.5) => Direction::Increased,
            _ => Direction::Decreased,
        };

        Some(price_alert(name, price, direction, now))
    }
}

/// Maybe build a weather alert for a random city
pub fn random_weather_alert<R: Rng + ?Sized>(
    probability: f64,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Option<Notification> {
    if !rng.gen_bool(probability.clamp(0.0, 1.0)) {
        return None;
    }

    let city = ALERT_CITIES.choose(rng)?;
    let message = WEATHER_ALERTS.choose(rng)?;
    Some(weather_alert(city, message, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn update(entries: &[(&str, f64)]) -> PriceUpdate {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0.5), "0.50");
        assert_eq!(format_usd(999.999), "1,000.00");
        assert_eq!(format_usd(64000.5), "64,000.50");
        assert_eq!(format_usd(1234567.891), "1,234,567.89");
        assert_eq!(format_usd(-1500.0), "-1,500.00");
    }

    #[test]
    fn test_price_alert_text() {
        let n = price_alert("Bitcoin", 64000.5, Direction::Increased, Utc::now());
        assert_eq!(n.title, "Bitcoin Price Alert");
        assert_eq!(n.message, "Bitcoin price has increased to $64,000.50");
        assert_eq!(n.kind, NotificationKind::PriceAlert);
        assert!(!n.read);
    }

    #[test]
    fn test_alerter_prefers_bitcoin_and_tracks_direction() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut alerter = PriceAlerter::new(1.0);

        let first = alerter
            .on_update(&update(&[("ethereum", 3000.0), ("bitcoin", 60000.0)]), &mut rng, Utc::now())
            .unwrap();
        assert_eq!(first.title, "Bitcoin Price Alert");

        let up = alerter
            .on_update(&update(&[("bitcoin", 61000.0)]), &mut rng, Utc::now())
            .unwrap();
        assert_eq!(up.message, "Bitcoin price has increased to $61,000.00");

        let down = alerter
            .on_update(&update(&[("bitcoin", 59000.25)]), &mut rng, Utc::now())
            .unwrap();
        assert_eq!(down.message, "Bitcoin price has decreased to $59,000.25");
    }

    #[test]
    fn test_alerter_ignores_other_assets() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut alerter = PriceAlerter::new(1.0);

        assert!(alerter
            .on_update(&update(&[("dogecoin", 0.1)]), &mut rng, Utc::now())
            .is_none());
    }

    #[test]
    fn test_alerter_probability_zero_still_tracks_price() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut quiet = PriceAlerter::new(0.0);

        for price in [100.0, 200.0, 300.0] {
            assert!(quiet
                .on_update(&update(&[("ethereum", price)]), &mut rng, Utc::now())
                .is_none());
        }
        assert_eq!(quiet.last_prices.get("ethereum"), Some(&300.0));
    }

    #[test]
    fn test_random_weather_alert() {
        let mut rng = StdRng::seed_from_u64(4);

        assert!(random_weather_alert(0.0, &mut rng, Utc::now()).is_none());

        let n = random_weather_alert(1.0, &mut rng, Utc::now()).unwrap();
        assert_eq!(n.kind, NotificationKind::WeatherAlert);
        let city = n.title.trim_start_matches("Weather Alert: ");
        assert!(ALERT_CITIES.contains(&city));
        assert!(WEATHER_ALERTS.contains(&n.message.as_str()));
    }
}
