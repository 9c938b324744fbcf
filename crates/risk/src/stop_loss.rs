use tracing::debug;
use watchlist::WatchEntry;

/// Recompute the trailing stop from the latest price:
/// `stop = price - stop_loss_percent * price / 100`.
///
/// Not a strict ratchet: the stop is recomputed unconditionally, so callers
/// must only invoke it on confirmed favorable price action (after a buy
/// during an up move). The only writer of `WatchEntry::stop_loss`.
pub fn trail_stop_loss(entry: &mut WatchEntry, curr_price: f64) {
    let stop = curr_price - entry.stop_loss_percent * curr_price / 100.0;
    debug!(stop, curr_price, "Trailing stop recomputed");
    entry.stop_loss = Some(stop);
}

/// Inclusive: a price exactly on the stop triggers it.
pub fn is_price_below_stop_loss(curr_price: f64, stop_loss: f64) -> bool {
    curr_price <= stop_loss
}
