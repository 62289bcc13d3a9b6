//! Nexus CLI
//!
//! Runs the sync engine in the foreground or performs one-shot operations:
//! - Poll all domains until Ctrl-C
//! - Print the data status and favorites
//! - Toggle a favorite coin or city
//! - Show a coin's detail drill-down
//! - Generate a default config file

use anyhow::Context;
use clap::{Parser, Subcommand};
use nexus::fetch::{CoinGeckoClient, SimulatedNews, SimulatedWeather};
use nexus::{
    selectors, Config, DataStatus, Fetcher, NotificationListener, RefreshScheduler, Sources, Store,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "nexus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Crypto, weather and news sync engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: platform config dir, then ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll every domain and listen for notifications until Ctrl-C
    Run,

    /// Refresh once and show data status
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Toggle a favorite
    Favorite {
        #[command(subcommand)]
        target: FavoriteTarget,
    },

    /// Show details for a coin
    Details {
        /// Coin ID (e.g. bitcoin)
        coin: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum FavoriteTarget {
    /// Favorite coin, by ID
    Crypto { id: String },
    /// Favorite city, by name
    City { id: String },
}

/// Everything a command needs to talk to the store
struct Engine {
    store: Arc<Store>,
    fetcher: Fetcher,
}

impl Engine {
    fn build(config: &Config) -> anyhow::Result<Self> {
        let store = Arc::new(Store::with_cities(config.preferences(), &config.weather.cities));

        let prices = CoinGeckoClient::new(config.price_service())
            .context("Failed to build price service client")?;
        let sources = Sources::new(
            Arc::new(prices),
            Arc::new(SimulatedWeather::new()),
            Arc::new(SimulatedNews::new(Duration::from_millis(
                config.news.simulated_delay_ms,
            ))),
        );

        let fetcher = Fetcher::new(store.clone(), sources, config.fetch_policy());
        Ok(Self { store, fetcher })
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_with_env(path).context("Failed to load config"),
        None => Ok(Config::load_default()),
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("nexus={}", config.logging.level)));
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let config = nexus::generate_default_config();
        match output {
            Some(path) => {
                // Create parent directory if needed
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, &config)?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", config),
        }
        return Ok(());
    }

    let config = load_config(cli.config.as_ref())?;
    init_tracing(&config);

    match cli.command {
        Commands::Run => run(&config).await?,
        Commands::Status { json } => status(&config, json).await?,
        Commands::Favorite { target } => favorite(&config, target)?,
        Commands::Details { coin } => details(&config, &coin).await?,
        Commands::Config { .. } => {}
    }

    Ok(())
}

async fn run(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Starting Nexus v{}", env!("CARGO_PKG_VERSION"));

    let engine = Engine::build(config)?;
    let scheduler = RefreshScheduler::new(engine.fetcher.clone(), config.refresh_intervals());
    scheduler.start();

    let listener = NotificationListener::new(engine.store.clone(), config.listener());
    if config.notifications.enabled {
        listener.start();
    }

    let mut changes = engine.store.subscribe();
    let store = engine.store.clone();
    let observer = tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let revision = *changes.borrow_and_update();
            let unread = store.read(|s| s.notifications.unread_count());
            tracing::debug!(revision, unread, "State changed");
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutting down");

    scheduler.stop();
    listener.stop();
    observer.abort();

    let state = engine.store.snapshot();
    println!("{}", DataStatus::collect(&state, chrono::Utc::now(), false));
    Ok(())
}

async fn status(config: &Config, json: bool) -> anyhow::Result<()> {
    let engine = Engine::build(config)?;
    let scheduler = RefreshScheduler::new(engine.fetcher.clone(), config.refresh_intervals());
    scheduler.refresh_all().await;

    let state = engine.store.snapshot();
    let status = DataStatus::collect(&state, chrono::Utc::now(), false);
    let cryptos = selectors::favorite_cryptos(&state);
    let cities = selectors::favorite_cities(&state);

    if json {
        let body = serde_json::json!({
            "status": status,
            "favorite_cryptos": cryptos,
            "favorite_cities": cities,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("Nexus v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("{}", status);

    if !cryptos.is_empty() {
        println!();
        println!("Favorite coins:");
        for fav in &cryptos {
            match fav.price {
                Some(price) => println!(
                    "  {:<12} {:>14} ({:+.2}%)",
                    fav.asset.name,
                    nexus::notifications::format_usd(price.current_price),
                    price.price_change_percentage_24h
                ),
                None => println!("  {:<12} no data", fav.asset.name),
            }
        }
    }

    if !cities.is_empty() {
        println!();
        println!("Favorite cities:");
        for fav in &cities {
            match fav.weather {
                Some(weather) => println!(
                    "  {:<12} {:>5.1}°C {}",
                    fav.city, weather.temp, weather.description
                ),
                None => println!("  {:<12} no data", fav.city),
            }
        }
    }

    Ok(())
}

fn favorite(config: &Config, target: FavoriteTarget) -> anyhow::Result<()> {
    let store = Store::with_cities(config.preferences(), &config.weather.cities);
    if !store.prefs().is_available() {
        tracing::warn!("Preference storage unavailable; change will not persist");
    }

    let (kind, id, now_favorite) = match target {
        FavoriteTarget::Crypto { id } => {
            let on = store.toggle_favorite_crypto(&id);
            ("coin", id, on)
        }
        FavoriteTarget::City { id } => {
            let on = store.toggle_favorite_city(&id);
            ("city", id, on)
        }
    };

    if now_favorite {
        println!("Added {} {} to favorites", kind, id);
    } else {
        println!("Removed {} {} from favorites", kind, id);
    }
    Ok(())
}

async fn details(config: &Config, coin: &str) -> anyhow::Result<()> {
    let engine = Engine::build(config)?;
    let outcome = engine.fetcher.fetch_crypto_details(coin).await;

    let selected = engine.store.read(|s| s.crypto.selected.clone());
    let Some(details) = selected.filter(|d| d.id == coin) else {
        let error = engine
            .store
            .read(|s| s.crypto.meta.error.clone())
            .unwrap_or_else(|| format!("{:?}", outcome));
        anyhow::bail!("No details for {}: {}", coin, error);
    };

    println!("{} ({})", details.name, details.symbol.to_uppercase());
    if details.degraded {
        println!("  [simulated data: price service unavailable]");
    }
    println!("  Price:       {}", nexus::notifications::format_usd(details.current_price));
    println!("  24h change:  {:+.2}%", details.price_change_percentage_24h);
    println!("  Market cap:  {}", nexus::notifications::format_usd(details.market_cap));
    println!("  Volume 24h:  {}", nexus::notifications::format_usd(details.total_volume));
    println!("  Supply:      {:.0}", details.circulating_supply);

    if !details.price_history.is_empty() {
        println!();
        println!("  7-day history:");
        for point in &details.price_history {
            let day = chrono::DateTime::from_timestamp_millis(point.timestamp)
                .map(|dt| dt.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| point.timestamp.to_string());
            println!("    {}  {}", day, nexus::notifications::format_usd(point.price));
        }
    }

    if !details.description.is_empty() {
        println!();
        println!("{}", details.description);
    }

    Ok(())
}
