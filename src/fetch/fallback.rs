//! Fallback data synthesis
//!
//! Pure functions producing plausible data when a source is unavailable.
//! Randomness comes from the caller's RNG so a seeded generator gives
//! repeatable output.

use crate::state::crypto::capitalize;
use crate::state::{
    CryptoAsset, CryptoDetails, CryptoPayload, NewsItem, PricePoint, PriceSnapshot,
    WeatherHistoryPoint, WeatherSnapshot,
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::f64::consts::PI;

/// Description used for synthesized coin details
pub const DEGRADED_DESCRIPTION: &str = "Data temporarily unavailable. Please check back later.";

struct CoinDefaults {
    id: &'static str,
    name: &'static str,
    symbol: &'static str,
    base_price: f64,
    jitter: f64,
    market_cap: f64,
    total_volume: f64,
    circulating_supply: f64,
    image: &'static str,
}

const FALLBACK_COINS: [CoinDefaults; 3] = [
    CoinDefaults {
        id: "bitcoin",
        name: "Bitcoin",
        symbol: "btc",
        base_price: 50_000.0,
        jitter: 5_000.0,
        market_cap: 950_000_000_000.0,
        total_volume: 30_000_000_000.0,
        circulating_supply: 19_000_000.0,
        image: "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
    },
    CoinDefaults {
        id: "ethereum",
        name: "Ethereum",
        symbol: "eth",
        base_price: 3_000.0,
        jitter: 300.0,
        market_cap: 350_000_000_000.0,
        total_volume: 15_000_000_000.0,
        circulating_supply: 120_000_000.0,
        image: "https://assets.coingecko.com/coins/images/279/large/ethereum.png",
    },
    CoinDefaults {
        id: "ripple",
        name: "XRP",
        symbol: "xrp",
        base_price: 0.5,
        jitter: 0.1,
        market_cap: 25_000_000_000.0,
        total_volume: 1_000_000_000.0,
        circulating_supply: 45_000_000_000.0,
        image: "https://assets.coingecko.com/coins/images/44/large/xrp-symbol-white-128.png",
    },
];

fn change_24h<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(-5.0..5.0)
}

/// Market list for bitcoin, ethereum and XRP with jittered prices
pub fn crypto_payload<R: Rng + ?Sized>(rng: &mut R) -> CryptoPayload {
    let mut payload = CryptoPayload::default();

    for coin in &FALLBACK_COINS {
        payload.cryptos.push(CryptoAsset::new(coin.id, coin.name));
        payload.crypto_data.insert(
            coin.id.to_string(),
            PriceSnapshot {
                id: coin.id.to_string(),
                name: coin.name.to_string(),
                symbol: coin.symbol.to_string(),
                current_price: coin.base_price + rng.gen_range(0.0..coin.jitter),
                market_cap: coin.market_cap,
                total_volume: coin.total_volume,
                price_change_percentage_24h: change_24h(rng),
                circulating_supply: coin.circulating_supply,
                image: Some(coin.image.to_string()),
            },
        );
    }

    payload
}

/// Degraded drill-down for any coin ID
///
/// Known coins get their usual figures, anything else a generic small-cap
/// profile. The price history is a 7-day random walk ending at `now`.
pub fn crypto_details<R: Rng + ?Sized>(id: &str, now: DateTime<Utc>, rng: &mut R) -> CryptoDetails {
    let (current_price, market_cap, total_volume, circulating_supply) = match id {
        "bitcoin" => (50_000.0, 950_000_000_000.0, 30_000_000_000.0, 19_000_000.0),
        "ethereum" => (3_000.0, 350_000_000_000.0, 15_000_000_000.0, 120_000_000.0),
        _ => (1.0, 10_000_000_000.0, 500_000_000.0, 50_000_000_000.0),
    };

    let mut price = current_price * 0.9;
    let price_history = (0..7)
        .map(|i| {
            price *= 1.0 + rng.gen_range(-0.03..0.03);
            PricePoint {
                timestamp: (now - Duration::days(6 - i)).timestamp_millis(),
                price,
            }
        })
        .collect();

    CryptoDetails {
        id: id.to_string(),
        name: capitalize(id),
        symbol: id.chars().take(3).collect(),
        description: DEGRADED_DESCRIPTION.to_string(),
        image: None,
        current_price,
        market_cap,
        total_volume,
        price_change_percentage_24h: change_24h(rng),
        circulating_supply,
        price_history,
        degraded: true,
    }
}

fn icon_for(condition: &str) -> &'static str {
    match condition {
        "Clear" => "01d",
        "Rain" => "10d",
        _ => "03d",
    }
}

/// Current conditions for `city` in the given month (0 = January)
pub fn weather_snapshot<R: Rng + ?Sized>(city: &str, month0: u32, rng: &mut R) -> WeatherSnapshot {
    let summer = (5..=8).contains(&month0);

    let (temp, condition) = match city {
        "New York" if summer => (25.0 + rng.gen_range(0.0..5.0), "Clear"),
        "New York" => (10.0 + rng.gen_range(0.0..10.0), "Clouds"),
        "London" => {
            let temp = if summer {
                20.0 + rng.gen_range(0.0..5.0)
            } else {
                8.0 + rng.gen_range(0.0..8.0)
            };
            (temp, if rng.gen_bool(0.4) { "Rain" } else { "Clouds" })
        }
        "Tokyo" if summer => (28.0 + rng.gen_range(0.0..5.0), "Clear"),
        "Tokyo" => (12.0 + rng.gen_range(0.0..10.0), "Clouds"),
        _ => (
            20.0 + rng.gen_range(0.0..10.0),
            if rng.gen_bool(0.5) { "Clear" } else { "Clouds" },
        ),
    };

    WeatherSnapshot {
        temp,
        humidity: rng.gen_range(60..90),
        wind_speed: f64::from(rng.gen_range(2u8..10)),
        condition: condition.to_string(),
        description: condition.to_lowercase(),
        icon: icon_for(condition).to_string(),
    }
}

/// Seven daily points ending at `now`, oldest first, warmest mid-week
pub fn weather_history<R: Rng + ?Sized>(
    city: &str,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<WeatherHistoryPoint> {
    let (base_temp, variation, base_humidity): (f64, f64, f64) = match city {
        "New York" => (18.0, 8.0, 65.0),
        "London" => (15.0, 5.0, 75.0),
        "Tokyo" => (22.0, 7.0, 70.0),
        _ => (20.0, 6.0, 60.0),
    };

    let mut history: Vec<WeatherHistoryPoint> = (0..7i32)
        .map(|i| {
            let day_factor = (f64::from(i) / 6.0 * PI).sin() * 2.0;
            WeatherHistoryPoint {
                dt: (now - Duration::days(i64::from(i))).timestamp(),
                temp: (base_temp + day_factor * variation + rng.gen_range(-1.0..1.0)).round(),
                humidity: (base_humidity + rng.gen_range(-10.0..10.0)).round(),
            }
        })
        .collect();

    history.reverse();
    history
}

/// The fixed headline set served by the simulated news feed
pub fn news() -> Vec<NewsItem> {
    const ITEMS: [(&str, &str, &str, &str, &str); 6] = [
        (
            "Bitcoin Surges Past $60,000 as Institutional Adoption Grows",
            "Bitcoin has reached a new all-time high as major financial institutions continue to invest in the cryptocurrency.",
            "2023-04-15T08:30:00Z",
            "Crypto News",
            "1",
        ),
        (
            "Ethereum 2.0 Upgrade Set to Launch Next Month",
            "The long-awaited Ethereum 2.0 upgrade is scheduled to go live next month, promising improved scalability and reduced energy consumption.",
            "2023-04-14T14:45:00Z",
            "Blockchain Times",
            "2",
        ),
        (
            "Major Bank Announces Cryptocurrency Custody Service",
            "One of the world's largest banks has announced plans to offer cryptocurrency custody services to institutional clients.",
            "2023-04-13T10:15:00Z",
            "Financial Post",
            "3",
        ),
        (
            "New Regulatory Framework for Cryptocurrencies Proposed",
            "Lawmakers have introduced a new bill that aims to provide clear regulatory guidelines for cryptocurrencies and blockchain technology.",
            "2023-04-12T16:20:00Z",
            "Regulatory Watch",
            "4",
        ),
        (
            "NFT Market Continues to Expand with Record-Breaking Sales",
            "The market for non-fungible tokens (NFTs) is experiencing unprecedented growth, with several digital artworks selling for millions of dollars.",
            "2023-04-11T09:50:00Z",
            "Digital Art Daily",
            "5",
        ),
        (
            "Severe Weather Patterns Linked to Climate Change, Study Finds",
            "A new study has found strong evidence linking recent extreme weather events to ongoing climate change.",
            "2023-04-10T11:25:00Z",
            "Weather Network",
            "6",
        ),
    ];

    ITEMS
        .iter()
        .map(|(title, description, published_at, source, id)| NewsItem {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            url: format!("https://example.com/news/{}", id),
            published_at: published_at.to_string(),
            source: source.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_crypto_payload_shape() {
        let payload = crypto_payload(&mut StdRng::seed_from_u64(7));

        let ids: Vec<&str> = payload.cryptos.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["bitcoin", "ethereum", "ripple"]);
        assert_eq!(payload.cryptos[2].name, "XRP");

        let btc = &payload.crypto_data["bitcoin"];
        assert!((50_000.0..55_000.0).contains(&btc.current_price));
        assert!((-5.0..5.0).contains(&btc.price_change_percentage_24h));
        let xrp = &payload.crypto_data["ripple"];
        assert!((0.5..0.6).contains(&xrp.current_price));
    }

    #[test]
    fn test_seeded_rng_is_repeatable() {
        let a = crypto_payload(&mut StdRng::seed_from_u64(42));
        let b = crypto_payload(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);

        let a = weather_history("London", now(), &mut StdRng::seed_from_u64(42));
        let b = weather_history("London", now(), &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_crypto_details_unknown_coin() {
        let details = crypto_details("cardano", now(), &mut StdRng::seed_from_u64(1));

        assert_eq!(details.name, "Cardano");
        assert_eq!(details.symbol, "car");
        assert_eq!(details.description, DEGRADED_DESCRIPTION);
        assert_eq!(details.current_price, 1.0);
        assert_eq!(details.circulating_supply, 50_000_000_000.0);
        assert!(details.image.is_none());
        assert!(details.degraded);
    }

    #[test]
    fn test_crypto_details_history_walk() {
        let details = crypto_details("bitcoin", now(), &mut StdRng::seed_from_u64(3));

        assert_eq!(details.price_history.len(), 7);
        let last = details.price_history[6];
        assert_eq!(last.timestamp, now().timestamp_millis());
        assert!(details
            .price_history
            .windows(2)
            .all(|w| w[0].timestamp < w[1].timestamp));

        // Each step moves at most 3% from a start at 90% of the price
        let mut low = 45_000.0;
        let mut high = 45_000.0;
        for point in &details.price_history {
            low *= 0.97;
            high *= 1.03;
            assert!(point.price >= low && point.price <= high);
        }
    }

    #[test]
    fn test_weather_snapshot_seasons() {
        let mut rng = StdRng::seed_from_u64(9);

        let summer = weather_snapshot("Tokyo", 6, &mut rng);
        assert_eq!(summer.condition, "Clear");
        assert_eq!(summer.icon, "01d");
        assert!((28.0..33.0).contains(&summer.temp));

        let winter = weather_snapshot("New York", 0, &mut rng);
        assert_eq!(winter.condition, "Clouds");
        assert_eq!(winter.description, "clouds");
        assert_eq!(winter.icon, "03d");
        assert!((10.0..20.0).contains(&winter.temp));
    }

    #[test]
    fn test_weather_snapshot_ranges() {
        let mut rng = StdRng::seed_from_u64(11);
        for month in 0..12 {
            for city in ["New York", "London", "Tokyo", "Reykjavik"] {
                let snap = weather_snapshot(city, month, &mut rng);
                assert!((60..90).contains(&snap.humidity));
                assert!((2.0..10.0).contains(&snap.wind_speed));
                assert_eq!(snap.icon, icon_for(&snap.condition));
                if city == "London" {
                    assert!(snap.condition == "Rain" || snap.condition == "Clouds");
                }
            }
        }
    }

    #[test]
    fn test_weather_history_oldest_first() {
        let history = weather_history("New York", now(), &mut StdRng::seed_from_u64(5));

        assert_eq!(history.len(), 7);
        assert_eq!(history[6].dt, now().timestamp());
        assert_eq!(history[0].dt, (now() - Duration::days(6)).timestamp());
        for point in &history {
            assert!((55.0..=75.0).contains(&point.humidity));
            assert_eq!(point.humidity.fract(), 0.0);
            assert_eq!(point.temp.fract(), 0.0);
        }
        // Mid-week bump
        assert!(history[3].temp > history[0].temp);
    }

    #[test]
    fn test_news_fixed_set() {
        let items = news();
        assert_eq!(items.len(), 6);
        assert_eq!(items[0].id, "1");
        assert_eq!(items[0].url, "https://example.com/news/1");
        assert_eq!(items[5].source, "Weather Network");
    }
}
