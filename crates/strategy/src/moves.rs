use watchlist::WatchEntry;

/// True iff the entry has never observed a price. New entries skip all
/// move/streak logic on their first pass; only the price is initialized.
pub fn is_new_to_watchlist(entry: &WatchEntry) -> bool {
    entry.last_price.is_none()
}

/// Strict: an unchanged price is neither an up nor a down move.
pub fn is_up_move(prev_price: f64, curr_price: f64) -> bool {
    curr_price > prev_price
}

pub fn is_down_move(prev_price: f64, curr_price: f64) -> bool {
    curr_price < prev_price
}

/// Threshold is a run parameter, not per-stock.
pub fn streak_reached_threshold(streak: u32, threshold: u32) -> bool {
    streak >= threshold
}
