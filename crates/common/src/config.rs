use crate::{PassParams, TradingMode};

const LIVE_BASE_URL: &str = "https://api.alpaca.markets";
const PAPER_BASE_URL: &str = "https://paper-api.alpaca.markets";
const DEFAULT_DATA_URL: &str = "https://data.alpaca.markets";

/// All configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Brokerage credentials
    pub alpaca_api_key_id: String,
    pub alpaca_api_secret_key: String,
    pub alpaca_base_url: String,
    pub alpaca_data_url: String,

    // Trading
    pub trading_mode: TradingMode,
    pub params: PassParams,

    // Watchlist
    pub watchlist_path: String,
    pub watchlist_config_path: String,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let trading_mode = match required_env("TRADING_MODE").to_lowercase().as_str() {
            "paper" => TradingMode::Paper,
            "live" => TradingMode::Live,
            other => panic!("ERROR: TRADING_MODE must be 'paper' or 'live', got: '{other}'"),
        };

        let defaults = PassParams::default();
        let params = PassParams {
            streak_threshold: parsed_env("STREAK_THRESHOLD", defaults.streak_threshold),
            trade_threshold_pct: parsed_env("TRADE_THRESHOLD_PCT", defaults.trade_threshold_pct),
            buy_quantity: parsed_env("BUY_QUANTITY", defaults.buy_quantity),
            sell_quantity: parsed_env("SELL_QUANTITY", defaults.sell_quantity),
        };
        assert!(
            params.streak_threshold >= 1,
            "STREAK_THRESHOLD must be >= 1, got: {}",
            params.streak_threshold
        );
        assert!(
            params.trade_threshold_pct > 0.0 && params.trade_threshold_pct <= 100.0,
            "TRADE_THRESHOLD_PCT must be in (0, 100], got: {}",
            params.trade_threshold_pct
        );
        assert!(
            params.buy_quantity > 0.0 && params.sell_quantity > 0.0,
            "BUY_QUANTITY and SELL_QUANTITY must be > 0, got: {} / {}",
            params.buy_quantity,
            params.sell_quantity
        );

        Config {
            alpaca_api_key_id: required_env("APCA_API_KEY_ID"),
            alpaca_api_secret_key: required_env("APCA_API_SECRET_KEY"),
            alpaca_base_url: optional_env("APCA_API_BASE_URL").unwrap_or_else(|| {
                match trading_mode {
                    TradingMode::Live => LIVE_BASE_URL.to_string(),
                    TradingMode::Paper => PAPER_BASE_URL.to_string(),
                }
            }),
            alpaca_data_url: optional_env("APCA_API_DATA_URL")
                .unwrap_or_else(|| DEFAULT_DATA_URL.to_string()),
            trading_mode,
            params,
            watchlist_path: optional_env("WATCHLIST_PATH")
                .unwrap_or_else(|| "assets/watchlist.json".to_string()),
            watchlist_config_path: optional_env("WATCHLIST_CONFIG_PATH")
                .unwrap_or_else(|| "config/watchlist.toml".to_string()),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    optional_env(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
