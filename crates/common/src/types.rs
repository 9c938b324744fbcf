use serde::{Deserialize, Serialize};

/// Side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
            OrderSide::Sell => write!(f, "sell"),
        }
    }
}

/// An order to be submitted to the brokerage.
/// The engine only ever places market orders valid for the day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
}

impl Order {
    pub fn market(symbol: impl Into<String>, side: OrderSide, quantity: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.into(),
            side,
            quantity,
        }
    }
}

/// An open position as reported by the brokerage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub avg_entry_price: f64,
}

/// Account state fetched once per engine pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub buying_power: f64,
    pub trading_blocked: bool,
}

/// Direction of the move a watched stock is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum MoveDirection {
    #[default]
    None,
    Up,
    Down,
}

impl std::fmt::Display for MoveDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveDirection::None => write!(f, "NONE"),
            MoveDirection::Up => write!(f, "UP"),
            MoveDirection::Down => write!(f, "DOWN"),
        }
    }
}

/// Whether the bot runs against the real brokerage or simulates fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    Live,
    Paper,
}

impl std::fmt::Display for TradingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradingMode::Live => write!(f, "live"),
            TradingMode::Paper => write!(f, "paper"),
        }
    }
}

/// Run parameters for one engine pass. Constructed externally; the engine
/// never mutates them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PassParams {
    /// Streak length at which a move becomes actionable.
    pub streak_threshold: u32,
    /// Percentage of buying power allocatable to a single trade.
    pub trade_threshold_pct: f64,
    pub buy_quantity: f64,
    pub sell_quantity: f64,
}

impl Default for PassParams {
    fn default() -> Self {
        Self {
            streak_threshold: 7,
            trade_threshold_pct: 33.0,
            buy_quantity: 5.0,
            sell_quantity: 5.0,
        }
    }
}

/// An alert produced during a pass. Appended to a caller-owned ordered
/// buffer; the core never reads alerts back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Alert {
    Move {
        symbol: String,
        direction: MoveDirection,
        streak: u32,
    },
    TradingBlocked {
        symbol: String,
        direction: MoveDirection,
        streak: u32,
    },
    FundingShortfall {
        symbol: String,
        direction: MoveDirection,
        streak: u32,
        shortfall: f64,
    },
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Alert::Move { symbol, direction, streak } => {
                write!(f, "ALERT {symbol} in {direction} MOVE for last {streak} days")
            }
            Alert::TradingBlocked { symbol, direction, streak } => {
                write!(
                    f,
                    "trading blocked. ALERT {symbol} in {direction} MOVE for last {streak} days"
                )
            }
            Alert::FundingShortfall { symbol, direction, streak, shortfall } => {
                write!(
                    f,
                    "Not enough funds, please add {shortfall}$. \
                     ALERT {symbol} in {direction} MOVE for last {streak} days"
                )
            }
        }
    }
}
