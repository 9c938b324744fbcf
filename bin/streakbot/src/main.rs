use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::{AlertMailer, BrokerClient, Config, LogMailer};
use engine::{AlpacaClient, Engine};
use watchlist::{JsonFileRepository, WatchlistFileConfig};

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(mode = %cfg.trading_mode, "StreakBot starting");

    // ── Broker ────────────────────────────────────────────────────────────────
    // Paper mode points the same client at Alpaca's paper endpoint.
    let broker: Arc<dyn BrokerClient> = Arc::new(AlpacaClient::new(
        &cfg.alpaca_api_key_id,
        &cfg.alpaca_api_secret_key,
        &cfg.alpaca_base_url,
        &cfg.alpaca_data_url,
    ));

    // ── Watchlist ─────────────────────────────────────────────────────────────
    let repo = Arc::new(JsonFileRepository::new(&cfg.watchlist_path));
    let seed = WatchlistFileConfig::load(&cfg.watchlist_config_path);
    info!(stocks = seed.stocks.len(), "Watchlist config loaded");

    // ── Engine ────────────────────────────────────────────────────────────────
    let engine = Engine::new(broker, repo, cfg.params).with_seed(seed);
    let alerts = engine.run().await;

    // ── Alerts ────────────────────────────────────────────────────────────────
    if !alerts.is_empty() {
        let mailer = LogMailer;
        if let Err(e) = mailer.deliver(&alerts).await {
            warn!(error = %e, "Alert delivery failed");
        }
    }

    info!(alerts = alerts.len(), "StreakBot pass finished");
}
