use common::MoveDirection;
use serde::{Deserialize, Serialize};

/// Whether a watched stock is alert-only or trade-enabled.
/// Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WatchKind {
    Alert,
    Trade,
}

/// Per-stock watchlist state. The persisted form keeps the legacy field
/// names and encodes absent numeric fields as the string `"NONE"` instead of
/// null; in memory they are plain `Option`s. The duality lives only here, at
/// the serde boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEntry {
    #[serde(rename = "type")]
    pub kind: WatchKind,
    /// `None` = never observed; move/streak logic is skipped on the first
    /// observation of a new entry.
    #[serde(rename = "LAST_PRICE", with = "sentinel")]
    pub last_price: Option<f64>,
    #[serde(rename = "MOVE_TYPE")]
    pub move_dir: MoveDirection,
    #[serde(with = "sentinel")]
    pub streak: Option<u32>,
    /// Derived only from the stop-loss trailing formula, never set directly.
    #[serde(with = "sentinel")]
    pub stop_loss: Option<f64>,
    /// Percentage in (0, 100], fixed per entry.
    pub stop_loss_percent: f64,
}

impl WatchEntry {
    /// A freshly configured entry that has never observed a price.
    pub fn new(kind: WatchKind, stop_loss_percent: f64) -> Self {
        Self {
            kind,
            last_price: None,
            move_dir: MoveDirection::None,
            streak: None,
            stop_loss: None,
            stop_loss_percent,
        }
    }
}

/// Serde adapter for the persisted sentinel: `Some(v)` round-trips as the
/// bare value, `None` as the string `"NONE"`.
mod sentinel {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    const NONE: &str = "NONE";

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field<T> {
        Value(T),
        Absent(String),
    }

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(v) => v.serialize(serializer),
            None => serializer.serialize_str(NONE),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        match Field::<T>::deserialize(deserializer)? {
            Field::Value(v) => Ok(Some(v)),
            Field::Absent(s) if s == NONE => Ok(None),
            Field::Absent(s) => Err(serde::de::Error::custom(format!(
                r#"expected a number or "NONE", got "{s}""#
            ))),
        }
    }
}
