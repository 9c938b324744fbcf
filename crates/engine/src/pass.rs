use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use common::{
    AccountSnapshot, Alert, BrokerClient, Error, MoveDirection, Order, OrderSide, PassParams,
    Result,
};
use risk::{funding_shortfall, has_enough_buying_power, is_price_below_stop_loss, trail_stop_loss};
use strategy::{is_down_move, is_new_to_watchlist, is_up_move, streak_reached_threshold};
use watchlist::{WatchKind, Watchlist, WatchlistFileConfig, WatchlistRepository};

/// The per-tick decision engine. One call to [`Engine::run`] is one pass:
/// every watched symbol is evaluated once, in order, against the latest
/// prices, then the watchlist snapshot is stored.
///
/// Collaborator failures inside a symbol's decision are soft: the affected
/// sub-step is skipped with a debug log, no alert is raised, and the pass
/// continues. A failure of the pass itself (account fetch, snapshot
/// load/store) aborts the remainder without persisting anything.
pub struct Engine {
    broker: Arc<dyn BrokerClient>,
    repo: Arc<dyn WatchlistRepository>,
    params: PassParams,
    seed: Option<WatchlistFileConfig>,
}

impl Engine {
    pub fn new(
        broker: Arc<dyn BrokerClient>,
        repo: Arc<dyn WatchlistRepository>,
        params: PassParams,
    ) -> Self {
        Self {
            broker,
            repo,
            params,
            seed: None,
        }
    }

    /// Seed entries from configuration before each pass. Symbols already in
    /// the persisted snapshot keep their state.
    pub fn with_seed(mut self, seed: WatchlistFileConfig) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Run one pass, swallowing pass-level errors. An aborted pass yields an
    /// empty alert buffer and persists nothing.
    pub async fn run(&self) -> Vec<Alert> {
        match self.run_pass().await {
            Ok(alerts) => alerts,
            Err(e) => {
                warn!(error = %e, "Engine pass aborted");
                Vec::new()
            }
        }
    }

    /// One full pass over the watchlist. Returns the ordered alert buffer.
    pub async fn run_pass(&self) -> Result<Vec<Alert>> {
        if !self.broker.market_open().await? {
            info!("Market closed — skipping pass");
            return Ok(Vec::new());
        }

        let account = self.broker.account().await?;
        let mut watchlist = self.repo.load().await?;
        if let Some(seed) = &self.seed {
            seed.seed(&mut watchlist);
        }
        info!(symbols = watchlist.len(), "Engine pass starting");

        let mut alerts = Vec::new();

        for symbol in watchlist.symbols() {
            let curr = match self.broker.latest_close(&symbol).await {
                Ok(price) => price,
                Err(e) => {
                    debug!(symbol = %symbol, error = %e, "No current price — skipping symbol");
                    continue;
                }
            };

            let entry = watchlist
                .get(&symbol)
                .ok_or_else(|| Error::UnknownSymbol(symbol.clone()))?;

            if is_new_to_watchlist(entry) {
                debug!(symbol = %symbol, price = curr, "New symbol — initializing price only");
            } else {
                // prev is the price recorded at the end of the previous pass
                let prev = entry.last_price.unwrap_or(curr);
                let reference = self.fourteen_day_reference(&symbol, prev).await;
                self.evaluate_symbol(
                    &symbol,
                    prev,
                    curr,
                    reference,
                    &account,
                    &mut watchlist,
                    &mut alerts,
                )
                .await?;
            }

            // Unconditional, once per symbol, after all decisions.
            watchlist.record_price(&symbol, curr)?;
        }

        self.repo.store(&watchlist).await?;
        info!(alerts = alerts.len(), "Engine pass complete");
        Ok(alerts)
    }

    /// Reference close for up-move classification: 14 calendar days ago,
    /// degrading to the immediate prior price when unavailable.
    async fn fourteen_day_reference(&self, symbol: &str, fallback: f64) -> f64 {
        let date = Utc::now().date_naive() - Duration::days(14);
        match self.broker.close_on(symbol, date).await {
            Ok(price) => price,
            Err(e) => {
                debug!(
                    symbol = %symbol,
                    error = %e,
                    "14-day close unavailable — falling back to prior price"
                );
                fallback
            }
        }
    }

    /// The per-symbol decision. Down-move and up-move branches are mutually
    /// exclusive and evaluated in that order: when both would fire, the
    /// down-move wins.
    #[allow(clippy::too_many_arguments)]
    async fn evaluate_symbol(
        &self,
        symbol: &str,
        prev: f64,
        curr: f64,
        reference: f64,
        account: &AccountSnapshot,
        watchlist: &mut Watchlist,
        alerts: &mut Vec<Alert>,
    ) -> Result<()> {
        if is_down_move(prev, curr) {
            self.down_move(symbol, curr, account, watchlist, alerts)
                .await
        } else if is_up_move(reference, curr) {
            // Classification uses the 14-day reference; the streak gate
            // inside still compares against the immediate prior price.
            self.up_move(symbol, prev, curr, account, watchlist, alerts)
                .await
        } else {
            Ok(())
        }
    }

    async fn down_move(
        &self,
        symbol: &str,
        curr: f64,
        account: &AccountSnapshot,
        watchlist: &mut Watchlist,
        alerts: &mut Vec<Alert>,
    ) -> Result<()> {
        let entry = watchlist
            .get(symbol)
            .ok_or_else(|| Error::UnknownSymbol(symbol.to_string()))?;
        if entry.move_dir != MoveDirection::Down {
            watchlist.start_move(symbol, MoveDirection::Down)?;
        }
        let streak = watchlist.bump_streak(symbol)?;

        if !streak_reached_threshold(streak, self.params.streak_threshold) {
            return Ok(());
        }

        let entry = watchlist
            .get(symbol)
            .ok_or_else(|| Error::UnknownSymbol(symbol.to_string()))?;
        let (kind, direction, stop_loss) = (entry.kind, entry.move_dir, entry.stop_loss);

        match kind {
            WatchKind::Alert => alerts.push(Alert::Move {
                symbol: symbol.to_string(),
                direction,
                streak,
            }),
            WatchKind::Trade => {
                if account.trading_blocked {
                    alerts.push(Alert::TradingBlocked {
                        symbol: symbol.to_string(),
                        direction,
                        streak,
                    });
                    return Ok(());
                }
                // Failures from here on are soft: skip, no alert, no state change.
                match self.broker.position(symbol).await {
                    Ok(Some(_)) => {
                        let Some(stop) = stop_loss else {
                            debug!(symbol = %symbol, "No stop set — skipping sell");
                            return Ok(());
                        };
                        if is_price_below_stop_loss(curr, stop) {
                            let order =
                                Order::market(symbol, OrderSide::Sell, self.params.sell_quantity);
                            if let Err(e) = self.broker.submit_order(&order).await {
                                debug!(symbol = %symbol, error = %e, "Sell order failed — skipping");
                            }
                        }
                    }
                    Ok(None) => debug!(symbol = %symbol, "No open position — skipping sell"),
                    Err(e) => {
                        debug!(symbol = %symbol, error = %e, "Position lookup failed — skipping sell")
                    }
                }
            }
        }
        Ok(())
    }

    async fn up_move(
        &self,
        symbol: &str,
        prev: f64,
        curr: f64,
        account: &AccountSnapshot,
        watchlist: &mut Watchlist,
        alerts: &mut Vec<Alert>,
    ) -> Result<()> {
        // The streak only advances when today beats yesterday, even though
        // the branch was entered on the 14-day reference.
        let confirmed_today = curr > prev;
        if confirmed_today {
            let entry = watchlist
                .get(symbol)
                .ok_or_else(|| Error::UnknownSymbol(symbol.to_string()))?;
            if entry.move_dir != MoveDirection::Up {
                watchlist.start_move(symbol, MoveDirection::Up)?;
            }
            watchlist.bump_streak(symbol)?;
        }

        let entry = watchlist
            .get(symbol)
            .ok_or_else(|| Error::UnknownSymbol(symbol.to_string()))?;
        let (kind, direction, streak) = (entry.kind, entry.move_dir, entry.streak.unwrap_or(0));

        match kind {
            WatchKind::Alert => {
                if confirmed_today
                    && streak_reached_threshold(streak, self.params.streak_threshold)
                {
                    alerts.push(Alert::Move {
                        symbol: symbol.to_string(),
                        direction,
                        streak,
                    });
                }
            }
            WatchKind::Trade => {
                if account.trading_blocked {
                    alerts.push(Alert::TradingBlocked {
                        symbol: symbol.to_string(),
                        direction,
                        streak,
                    });
                } else if has_enough_buying_power(
                    account.buying_power,
                    self.params.trade_threshold_pct,
                    self.params.buy_quantity,
                    curr,
                ) {
                    let order = Order::market(symbol, OrderSide::Buy, self.params.buy_quantity);
                    if let Err(e) = self.broker.submit_order(&order).await {
                        debug!(symbol = %symbol, error = %e, "Buy order failed");
                    }
                    // The stop trails on the qualifying price either way;
                    // order failures are swallowed.
                    let entry = watchlist
                        .get_mut(symbol)
                        .ok_or_else(|| Error::UnknownSymbol(symbol.to_string()))?;
                    trail_stop_loss(entry, curr);
                } else {
                    alerts.push(Alert::FundingShortfall {
                        symbol: symbol.to_string(),
                        direction,
                        streak,
                        shortfall: funding_shortfall(
                            account.buying_power,
                            self.params.trade_threshold_pct,
                            self.params.buy_quantity,
                            curr,
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paper::PaperBroker;
    use watchlist::{MemoryRepository, WatchEntry};

    fn params() -> PassParams {
        PassParams {
            streak_threshold: 7,
            trade_threshold_pct: 33.0,
            buy_quantity: 5.0,
            sell_quantity: 5.0,
        }
    }

    fn entry(kind: WatchKind) -> WatchEntry {
        WatchEntry::new(kind, 5.0)
    }

    struct Harness {
        broker: Arc<PaperBroker>,
        repo: Arc<MemoryRepository>,
        engine: Engine,
    }

    fn harness(watchlist: Watchlist, p: PassParams) -> Harness {
        let broker = Arc::new(PaperBroker::new(10_000.0));
        let repo = Arc::new(MemoryRepository::new(watchlist));
        let engine = Engine::new(broker.clone(), repo.clone(), p);
        Harness {
            broker,
            repo,
            engine,
        }
    }

    fn fourteen_days_ago() -> chrono::NaiveDate {
        Utc::now().date_naive() - Duration::days(14)
    }

    #[tokio::test]
    async fn new_symbol_only_initializes_price() {
        let mut wl = Watchlist::new();
        wl.insert("AAPL", entry(WatchKind::Trade));
        let h = harness(wl, params());
        h.broker.set_latest_close("AAPL", 182.5).await;

        let alerts = h.engine.run_pass().await.unwrap();

        assert!(alerts.is_empty());
        let snap = h.repo.snapshot().await;
        let aapl = snap.get("AAPL").unwrap();
        assert_eq!(aapl.last_price, Some(182.5));
        assert_eq!(aapl.move_dir, MoveDirection::None);
        assert_eq!(aapl.streak, None);
        assert!(h.broker.submitted_orders().await.is_empty());
    }

    #[tokio::test]
    async fn market_closed_skips_the_whole_pass() {
        let mut wl = Watchlist::new();
        let mut e = entry(WatchKind::Trade);
        e.last_price = Some(100.0);
        wl.insert("AAPL", e);
        let h = harness(wl.clone(), params());
        h.broker.set_market_open(false).await;
        h.broker.set_latest_close("AAPL", 90.0).await;

        let alerts = h.engine.run_pass().await.unwrap();

        assert!(alerts.is_empty());
        // nothing observed, nothing persisted
        assert_eq!(h.repo.snapshot().await, wl);
    }

    #[tokio::test]
    async fn down_streak_at_threshold_sells_below_stop() {
        // The end-to-end scenario: TRADE entry already 9 days into a DOWN
        // move, price collapses through the stop.
        let mut wl = Watchlist::new();
        let mut e = entry(WatchKind::Trade);
        e.last_price = Some(154.32);
        e.move_dir = MoveDirection::Down;
        e.streak = Some(9);
        e.stop_loss = Some(110.0);
        wl.insert("JPM", e);
        let h = harness(wl, params());
        h.broker.set_latest_close("JPM", 101.0).await;
        h.broker
            .add_position(common::Position {
                symbol: "JPM".into(),
                quantity: 5.0,
                avg_entry_price: 150.0,
            })
            .await;

        let alerts = h.engine.run_pass().await.unwrap();

        assert!(alerts.is_empty());
        let orders = h.broker.submitted_orders().await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, OrderSide::Sell);
        assert_eq!(orders[0].quantity, 5.0);

        let snap = h.repo.snapshot().await;
        let jpm = snap.get("JPM").unwrap();
        assert_eq!(jpm.streak, Some(10));
        assert_eq!(jpm.last_price, Some(101.0));
    }

    #[tokio::test]
    async fn down_streak_without_position_sells_nothing() {
        let mut wl = Watchlist::new();
        let mut e = entry(WatchKind::Trade);
        e.last_price = Some(154.32);
        e.move_dir = MoveDirection::Down;
        e.streak = Some(9);
        e.stop_loss = Some(110.0);
        wl.insert("JPM", e);
        let h = harness(wl, params());
        h.broker.set_latest_close("JPM", 101.0).await;

        let alerts = h.engine.run_pass().await.unwrap();

        assert!(alerts.is_empty());
        assert!(h.broker.submitted_orders().await.is_empty());
        // streak and price still advance
        let snap = h.repo.snapshot().await;
        assert_eq!(snap.get("JPM").unwrap().streak, Some(10));
    }

    #[tokio::test]
    async fn down_streak_alert_kind_emits_move_alert() {
        let mut wl = Watchlist::new();
        let mut e = entry(WatchKind::Alert);
        e.last_price = Some(120.0);
        e.move_dir = MoveDirection::Down;
        e.streak = Some(6);
        wl.insert("MSFT", e);
        let h = harness(wl, params());
        h.broker.set_latest_close("MSFT", 118.0).await;

        let alerts = h.engine.run_pass().await.unwrap();

        assert_eq!(
            alerts,
            vec![Alert::Move {
                symbol: "MSFT".into(),
                direction: MoveDirection::Down,
                streak: 7,
            }]
        );
    }

    #[tokio::test]
    async fn direction_change_resets_streak_before_counting() {
        let mut wl = Watchlist::new();
        let mut e = entry(WatchKind::Alert);
        e.last_price = Some(100.0);
        e.move_dir = MoveDirection::Up;
        e.streak = Some(12);
        wl.insert("MSFT", e);
        let h = harness(wl, params());
        h.broker.set_latest_close("MSFT", 95.0).await;

        let alerts = h.engine.run_pass().await.unwrap();

        // 12 up-days do not carry into the new down move
        assert!(alerts.is_empty());
        let snap = h.repo.snapshot().await;
        let msft = snap.get("MSFT").unwrap();
        assert_eq!(msft.move_dir, MoveDirection::Down);
        assert_eq!(msft.streak, Some(1));
    }

    #[tokio::test]
    async fn up_move_buys_and_trails_stop() {
        let mut wl = Watchlist::new();
        let mut e = entry(WatchKind::Trade);
        e.last_price = Some(100.0);
        wl.insert("AAPL", e);
        let h = harness(wl, params());
        h.broker.set_latest_close("AAPL", 110.0).await;
        h.broker
            .set_close_on("AAPL", fourteen_days_ago(), 90.0)
            .await;

        let alerts = h.engine.run_pass().await.unwrap();

        assert!(alerts.is_empty());
        let orders = h.broker.submitted_orders().await;
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, OrderSide::Buy);
        assert_eq!(orders[0].quantity, 5.0);

        let snap = h.repo.snapshot().await;
        let aapl = snap.get("AAPL").unwrap();
        assert_eq!(aapl.move_dir, MoveDirection::Up);
        assert_eq!(aapl.streak, Some(1));
        // 110 - 5% of 110
        assert_eq!(aapl.stop_loss, Some(104.5));
        assert_eq!(aapl.last_price, Some(110.0));
    }

    #[tokio::test]
    async fn buy_failure_still_trails_stop() {
        let mut wl = Watchlist::new();
        let mut e = entry(WatchKind::Trade);
        e.last_price = Some(100.0);
        wl.insert("AAPL", e);
        let h = harness(wl, params());
        h.broker.set_latest_close("AAPL", 110.0).await;
        h.broker.set_fail_orders(true).await;

        let alerts = h.engine.run_pass().await.unwrap();

        // swallowed: no alert, no order, but the stop trailed
        assert!(alerts.is_empty());
        assert!(h.broker.submitted_orders().await.is_empty());
        let snap = h.repo.snapshot().await;
        assert_eq!(snap.get("AAPL").unwrap().stop_loss, Some(104.5));
    }

    #[tokio::test]
    async fn up_move_without_funds_emits_shortfall_alert() {
        let mut wl = Watchlist::new();
        let mut e = entry(WatchKind::Trade);
        e.last_price = Some(100.0);
        wl.insert("AAPL", e);
        let h = harness(wl, params());
        h.broker.set_buying_power(1000.0).await;
        h.broker.set_latest_close("AAPL", 110.0).await;

        let alerts = h.engine.run_pass().await.unwrap();

        assert_eq!(alerts.len(), 1);
        let Alert::FundingShortfall { shortfall, streak, .. } = &alerts[0] else {
            panic!("expected funding alert, got {:?}", alerts[0]);
        };
        // 5 * 110 / 0.33 - 1000
        assert!((shortfall - (5.0 * 110.0 / 0.33 - 1000.0)).abs() < 1e-9);
        assert_eq!(*streak, 1);
        assert!(h.broker.submitted_orders().await.is_empty());
    }

    #[tokio::test]
    async fn blocked_trading_alerts_instead_of_ordering() {
        let mut wl = Watchlist::new();
        let mut e = entry(WatchKind::Trade);
        e.last_price = Some(100.0);
        wl.insert("AAPL", e);
        let h = harness(wl, params());
        h.broker.set_trading_blocked(true).await;
        h.broker.set_latest_close("AAPL", 110.0).await;

        let alerts = h.engine.run_pass().await.unwrap();

        assert_eq!(alerts.len(), 1);
        assert!(matches!(alerts[0], Alert::TradingBlocked { .. }));
        assert!(h.broker.submitted_orders().await.is_empty());
    }

    #[tokio::test]
    async fn up_alert_needs_threshold_and_todays_confirmation() {
        let mut wl = Watchlist::new();
        let mut e = entry(WatchKind::Alert);
        e.last_price = Some(100.0);
        e.move_dir = MoveDirection::Up;
        e.streak = Some(6);
        wl.insert("MSFT", e);
        let h = harness(wl, params());
        h.broker.set_latest_close("MSFT", 101.0).await;

        let alerts = h.engine.run_pass().await.unwrap();

        // streak reaches 7 today and today beat yesterday
        assert_eq!(
            alerts,
            vec![Alert::Move {
                symbol: "MSFT".into(),
                direction: MoveDirection::Up,
                streak: 7,
            }]
        );
    }

    #[tokio::test]
    async fn up_classification_uses_fourteen_day_reference() {
        // Today is flat against yesterday but well above the 14-day close:
        // the up branch is entered, yet the streak must not advance and an
        // ALERT entry stays quiet.
        let mut wl = Watchlist::new();
        let mut e = entry(WatchKind::Alert);
        e.last_price = Some(100.0);
        e.move_dir = MoveDirection::Up;
        e.streak = Some(9);
        wl.insert("MSFT", e);
        let h = harness(wl, params());
        h.broker.set_latest_close("MSFT", 100.0).await;
        h.broker
            .set_close_on("MSFT", fourteen_days_ago(), 80.0)
            .await;

        let alerts = h.engine.run_pass().await.unwrap();

        assert!(alerts.is_empty());
        let snap = h.repo.snapshot().await;
        assert_eq!(snap.get("MSFT").unwrap().streak, Some(9));
    }

    #[tokio::test]
    async fn simultaneous_signals_resolve_to_down_move() {
        // Down against yesterday, up against the 14-day reference: the
        // down branch wins.
        let mut wl = Watchlist::new();
        let mut e = entry(WatchKind::Alert);
        e.last_price = Some(100.0);
        wl.insert("MSFT", e);
        let h = harness(wl, params());
        h.broker.set_latest_close("MSFT", 95.0).await;
        h.broker
            .set_close_on("MSFT", fourteen_days_ago(), 80.0)
            .await;

        h.engine.run_pass().await.unwrap();

        let snap = h.repo.snapshot().await;
        assert_eq!(snap.get("MSFT").unwrap().move_dir, MoveDirection::Down);
    }

    #[tokio::test]
    async fn flat_price_changes_nothing_but_the_timestamped_price() {
        let mut wl = Watchlist::new();
        let mut e = entry(WatchKind::Alert);
        e.last_price = Some(100.0);
        e.move_dir = MoveDirection::Down;
        e.streak = Some(3);
        wl.insert("MSFT", e);
        let h = harness(wl, params());
        h.broker.set_latest_close("MSFT", 100.0).await;

        let alerts = h.engine.run_pass().await.unwrap();

        assert!(alerts.is_empty());
        let snap = h.repo.snapshot().await;
        let msft = snap.get("MSFT").unwrap();
        assert_eq!(msft.move_dir, MoveDirection::Down);
        assert_eq!(msft.streak, Some(3));
    }

    #[tokio::test]
    async fn unpriced_symbol_is_skipped_and_left_untouched() {
        let mut wl = Watchlist::new();
        let mut stale = entry(WatchKind::Alert);
        stale.last_price = Some(50.0);
        wl.insert("GHOST", stale.clone());
        let mut live = entry(WatchKind::Alert);
        live.last_price = Some(100.0);
        live.move_dir = MoveDirection::Down;
        live.streak = Some(6);
        wl.insert("MSFT", live);
        let h = harness(wl, params());
        h.broker.set_latest_close("MSFT", 99.0).await;

        let alerts = h.engine.run_pass().await.unwrap();

        // the priced symbol still progresses
        assert_eq!(alerts.len(), 1);
        let snap = h.repo.snapshot().await;
        assert_eq!(snap.get("GHOST").unwrap(), &stale);
    }

    struct BrokenRepository;

    #[async_trait::async_trait]
    impl WatchlistRepository for BrokenRepository {
        async fn load(&self) -> common::Result<Watchlist> {
            Err(Error::Io(std::io::Error::other("disk gone")))
        }

        async fn store(&self, _watchlist: &Watchlist) -> common::Result<()> {
            Err(Error::Io(std::io::Error::other("disk gone")))
        }
    }

    #[tokio::test]
    async fn run_swallows_pass_level_errors() {
        let broker = Arc::new(PaperBroker::new(10_000.0));
        let engine = Engine::new(broker, Arc::new(BrokenRepository), params());

        let alerts = engine.run().await;
        assert!(alerts.is_empty());
    }
}
