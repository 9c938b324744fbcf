//! The decision engine: one pass over the watchlist per invocation, plus the
//! Alpaca REST client it runs against in live and paper modes.

pub mod alpaca;
pub mod pass;

pub use alpaca::AlpacaClient;
pub use pass::Engine;
