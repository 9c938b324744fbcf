pub mod config;
pub mod entry;
pub mod repo;
pub mod store;

pub use config::{StockConfig, WatchlistFileConfig};
pub use entry::{WatchEntry, WatchKind};
pub use repo::{JsonFileRepository, MemoryRepository, WatchlistRepository};
pub use store::Watchlist;
