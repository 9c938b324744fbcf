use std::collections::BTreeMap;

use common::{Error, MoveDirection, Result};
use serde::{Deserialize, Serialize};

use crate::entry::WatchEntry;

/// The watchlist: one entry per tracked symbol. The sole mutable shared
/// state the engine touches. Keyed mutations return an explicit
/// `Error::UnknownSymbol` for absent symbols instead of inserting.
///
/// Backed by a `BTreeMap` so iteration (and the persisted snapshot) is
/// deterministic across passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watchlist {
    entries: BTreeMap<String, WatchEntry>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<&WatchEntry> {
        self.entries.get(symbol)
    }

    pub fn get_mut(&mut self, symbol: &str) -> Option<&mut WatchEntry> {
        self.entries.get_mut(symbol)
    }

    pub fn insert(&mut self, symbol: impl Into<String>, entry: WatchEntry) {
        self.entries.insert(symbol.into(), entry);
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    pub fn symbols(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &WatchEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Enter a new move: set the direction and reset the streak to 0.
    pub fn start_move(&mut self, symbol: &str, direction: MoveDirection) -> Result<()> {
        let entry = self.entry_mut(symbol)?;
        entry.move_dir = direction;
        entry.streak = Some(0);
        Ok(())
    }

    /// Increment the streak by one, returning the new value.
    /// A sentinel streak counts as 0 rather than failing the pass.
    pub fn bump_streak(&mut self, symbol: &str) -> Result<u32> {
        let entry = self.entry_mut(symbol)?;
        let streak = entry.streak.unwrap_or(0) + 1;
        entry.streak = Some(streak);
        Ok(streak)
    }

    /// Record the latest observed price. Called exactly once per pass per
    /// symbol, after all decisions for that symbol are finalized.
    pub fn record_price(&mut self, symbol: &str, price: f64) -> Result<()> {
        self.entry_mut(symbol)?.last_price = Some(price);
        Ok(())
    }

    fn entry_mut(&mut self, symbol: &str) -> Result<&mut WatchEntry> {
        self.entries
            .get_mut(symbol)
            .ok_or_else(|| Error::UnknownSymbol(symbol.to_string()))
    }
}
