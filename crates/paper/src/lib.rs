use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::{debug, info};

use common::{AccountSnapshot, BrokerClient, Error, Order, Position, Result};

/// Simulated brokerage for offline runs and engine tests.
///
/// Prices, account state and positions are scripted by the caller; submitted
/// orders are recorded instead of being sent anywhere. Order submission can
/// be made to fail on demand to exercise the engine's skip-on-failure paths.
pub struct PaperBroker {
    market_open: RwLock<bool>,
    account: RwLock<AccountSnapshot>,
    /// Latest daily close per symbol.
    latest_closes: RwLock<HashMap<String, f64>>,
    /// Historical daily closes, keyed by (symbol, date).
    dated_closes: RwLock<HashMap<(String, NaiveDate), f64>>,
    positions: RwLock<Vec<Position>>,
    orders: RwLock<Vec<Order>>,
    fail_orders: RwLock<bool>,
}

impl PaperBroker {
    pub fn new(buying_power: f64) -> Self {
        info!(buying_power, "PaperBroker initialized");
        Self {
            market_open: RwLock::new(true),
            account: RwLock::new(AccountSnapshot {
                buying_power,
                trading_blocked: false,
            }),
            latest_closes: RwLock::new(HashMap::new()),
            dated_closes: RwLock::new(HashMap::new()),
            positions: RwLock::new(Vec::new()),
            orders: RwLock::new(Vec::new()),
            fail_orders: RwLock::new(false),
        }
    }

    pub async fn set_market_open(&self, open: bool) {
        *self.market_open.write().await = open;
    }

    pub async fn set_trading_blocked(&self, blocked: bool) {
        self.account.write().await.trading_blocked = blocked;
    }

    pub async fn set_buying_power(&self, buying_power: f64) {
        self.account.write().await.buying_power = buying_power;
    }

    pub async fn set_latest_close(&self, symbol: &str, price: f64) {
        self.latest_closes
            .write()
            .await
            .insert(symbol.to_string(), price);
    }

    pub async fn set_close_on(&self, symbol: &str, date: NaiveDate, price: f64) {
        self.dated_closes
            .write()
            .await
            .insert((symbol.to_string(), date), price);
    }

    pub async fn add_position(&self, position: Position) {
        self.positions.write().await.push(position);
    }

    /// Make every subsequent `submit_order` fail.
    pub async fn set_fail_orders(&self, fail: bool) {
        *self.fail_orders.write().await = fail;
    }

    /// Orders recorded so far, in submission order.
    pub async fn submitted_orders(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }
}

#[async_trait]
impl BrokerClient for PaperBroker {
    async fn market_open(&self) -> Result<bool> {
        Ok(*self.market_open.read().await)
    }

    async fn account(&self) -> Result<AccountSnapshot> {
        Ok(*self.account.read().await)
    }

    async fn latest_close(&self, symbol: &str) -> Result<f64> {
        self.latest_closes
            .read()
            .await
            .get(symbol)
            .copied()
            .ok_or_else(|| Error::Broker(format!("No price scripted for {symbol}")))
    }

    async fn close_on(&self, symbol: &str, date: NaiveDate) -> Result<f64> {
        self.dated_closes
            .read()
            .await
            .get(&(symbol.to_string(), date))
            .copied()
            .ok_or_else(|| Error::Broker(format!("No {date} close scripted for {symbol}")))
    }

    async fn submit_order(&self, order: &Order) -> Result<()> {
        if *self.fail_orders.read().await {
            return Err(Error::Broker("Order submission scripted to fail".into()));
        }
        debug!(
            symbol = %order.symbol,
            side = %order.side,
            qty = order.quantity,
            "Paper order recorded"
        );
        self.orders.write().await.push(order.clone());
        Ok(())
    }

    async fn position(&self, symbol: &str) -> Result<Option<Position>> {
        Ok(self
            .positions
            .read()
            .await
            .iter()
            .find(|p| p.symbol == symbol)
            .cloned())
    }
}
