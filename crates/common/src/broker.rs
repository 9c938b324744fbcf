use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{AccountSnapshot, Order, Position, Result};

/// Abstraction over the brokerage connection.
///
/// `AlpacaClient` implements this for live trading.
/// `PaperBroker` implements this for simulation.
///
/// Every call is a single attempt from the engine's perspective: no retries
/// happen here. The engine treats each method as fallible and skips the
/// affected sub-step on failure.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Whether the market is currently open for trading.
    async fn market_open(&self) -> Result<bool>;

    /// Buying power and trading-blocked flag, fetched once per pass.
    async fn account(&self) -> Result<AccountSnapshot>;

    /// Latest daily close for a symbol.
    async fn latest_close(&self, symbol: &str) -> Result<f64>;

    /// Daily close for a symbol on a specific date.
    async fn close_on(&self, symbol: &str, date: NaiveDate) -> Result<f64>;

    /// Submit a market order, valid for the day. No partial fills modeled.
    async fn submit_order(&self, order: &Order) -> Result<()>;

    /// Look up the open position for a symbol. `Ok(None)` when not held.
    async fn position(&self, symbol: &str) -> Result<Option<Position>>;
}
