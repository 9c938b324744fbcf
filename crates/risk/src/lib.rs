//! Numeric risk checks the engine consults before acting: the trailing
//! stop-loss floor and the buying-power allocation cap.

pub mod funding;
pub mod stop_loss;

pub use funding::{funding_shortfall, has_enough_buying_power};
pub use stop_loss::{is_price_below_stop_loss, trail_stop_loss};
