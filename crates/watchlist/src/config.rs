use serde::{Deserialize, Serialize};

use crate::entry::{WatchEntry, WatchKind};
use crate::store::Watchlist;

/// Watchlist seed file (TOML). Entries are created from configuration
/// before the engine runs; the engine itself never creates or deletes them.
///
/// Example `config/watchlist.toml`:
/// ```toml
/// [[stock]]
/// symbol = "AAPL"
/// kind = "TRADE"
/// stop_loss_percent = 5.0
///
/// [[stock]]
/// symbol = "JPM"
/// kind = "ALERT"
/// stop_loss_percent = 2.0
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchlistFileConfig {
    #[serde(rename = "stock")]
    pub stocks: Vec<StockConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StockConfig {
    pub symbol: String,
    pub kind: WatchKind,
    pub stop_loss_percent: f64,
}

impl WatchlistFileConfig {
    /// Load from a TOML file. Exits process on error.
    pub fn load(path: &str) -> Self {
        let content = std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read watchlist config at '{path}': {e}"));
        let cfg: Self = toml::from_str(&content)
            .unwrap_or_else(|e| panic!("Failed to parse watchlist config at '{path}': {e}"));
        for stock in &cfg.stocks {
            assert!(
                stock.stop_loss_percent > 0.0 && stock.stop_loss_percent <= 100.0,
                "stop_loss_percent for '{}' must be in (0, 100], got: {}",
                stock.symbol,
                stock.stop_loss_percent
            );
        }
        cfg
    }

    /// Insert configured symbols missing from the loaded snapshot as fresh
    /// entries. Existing entries keep their state untouched.
    pub fn seed(&self, watchlist: &mut Watchlist) {
        for stock in &self.stocks {
            if !watchlist.contains(&stock.symbol) {
                watchlist.insert(
                    stock.symbol.clone(),
                    WatchEntry::new(stock.kind, stock.stop_loss_percent),
                );
            }
        }
    }
}
