use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Brokerage API error: {0}")]
    Broker(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A move-start (or other keyed mutation) was requested for a symbol
    /// absent from the watchlist. Fails that symbol only; callers check it.
    #[error("Symbol not in watchlist: {0}")]
    UnknownSymbol(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
