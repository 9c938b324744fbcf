//! Move detection: classifies price transitions as up/down moves and
//! decides when a streak has reached the actionable threshold.
//!
//! Direction is evaluated asymmetrically by the engine on purpose: a down
//! move compares yesterday's price to today's, while the up-move
//! classification compares the close from 14 calendar days ago to today's
//! (the streak increment still gates on today beating yesterday). The 14-day
//! reference dampens one-day noise before an up-move escalates to a trade.

pub mod moves;

pub use moves::{is_down_move, is_new_to_watchlist, is_up_move, streak_reached_threshold};
