use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use common::Result;

use crate::store::Watchlist;

/// Snapshot persistence for the watchlist: load before the pass, store
/// after. Always a full snapshot keyed by symbol — no partial writes.
#[async_trait]
pub trait WatchlistRepository: Send + Sync {
    async fn load(&self) -> Result<Watchlist>;
    async fn store(&self, watchlist: &Watchlist) -> Result<()>;
}

/// Flat JSON file in the legacy snapshot format (symbol → entry, with
/// `"NONE"` sentinels for absent numeric fields).
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl WatchlistRepository for JsonFileRepository {
    async fn load(&self) -> Result<Watchlist> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No watchlist snapshot yet, starting empty");
            return Ok(Watchlist::new());
        }
        let data = tokio::fs::read_to_string(&self.path).await?;
        let watchlist: Watchlist = serde_json::from_str(&data)?;
        debug!(
            path = %self.path.display(),
            symbols = watchlist.len(),
            "Watchlist snapshot loaded"
        );
        Ok(watchlist)
    }

    async fn store(&self, watchlist: &Watchlist) -> Result<()> {
        let data = serde_json::to_string_pretty(watchlist)?;
        tokio::fs::write(&self.path, data).await?;
        debug!(
            path = %self.path.display(),
            symbols = watchlist.len(),
            "Watchlist snapshot stored"
        );
        Ok(())
    }
}

/// In-memory repository for tests and paper runs.
pub struct MemoryRepository {
    inner: RwLock<Watchlist>,
}

impl MemoryRepository {
    pub fn new(watchlist: Watchlist) -> Self {
        Self {
            inner: RwLock::new(watchlist),
        }
    }

    /// Current snapshot, for assertions after a pass.
    pub async fn snapshot(&self) -> Watchlist {
        self.inner.read().await.clone()
    }
}

#[async_trait]
impl WatchlistRepository for MemoryRepository {
    async fn load(&self) -> Result<Watchlist> {
        Ok(self.inner.read().await.clone())
    }

    async fn store(&self, watchlist: &Watchlist) -> Result<()> {
        *self.inner.write().await = watchlist.clone();
        Ok(())
    }
}
