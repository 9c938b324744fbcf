/// Risk cap on a single position: only `trade_threshold_pct` of total buying
/// power may be allocated to one order. Compares that allocation ceiling
/// (not full buying power) against the proposed order notional.
pub fn has_enough_buying_power(
    buying_power: f64,
    trade_threshold_pct: f64,
    buy_quantity: f64,
    curr_price: f64,
) -> bool {
    buying_power * trade_threshold_pct / 100.0 > buy_quantity * curr_price
}

/// Amount the account is short of covering the proposed order under the
/// allocation cap. Reported in the funding alert.
pub fn funding_shortfall(
    buying_power: f64,
    trade_threshold_pct: f64,
    buy_quantity: f64,
    curr_price: f64,
) -> f64 {
    buy_quantity * curr_price / (trade_threshold_pct / 100.0) - buying_power
}
