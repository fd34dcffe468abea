//! Trade - a closed round trip derived from matched executions
//!
//! A Trade is created once matching completes for a quantity slice and is
//! immutable afterwards, except for the commission-repricing pass which
//! rewrites commission and net P&L while preserving the gross component.

use crate::types::{Cash, Percentage, Price, Quantity, SequenceKey, Symbol, Timestamp};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Signed multiplier for P&L: +1 for Long, -1 for Short
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

/// A closed round-trip trade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Contract symbol
    pub symbol: Symbol,
    /// Direction of the position that was closed
    pub direction: Direction,
    /// Matched quantity (contracts)
    pub quantity: Quantity,
    /// Entry price (volume-weighted when several fills opened)
    pub entry_price: Price,
    /// Exit price (volume-weighted when several fills closed)
    pub exit_price: Price,
    /// Entry timestamp
    pub entered_at: Timestamp,
    /// Exit timestamp
    pub exited_at: Timestamp,
    /// Entry trading day
    pub entry_day: NaiveDate,
    /// Exit trading day (drives the commission regime and monthly volume)
    pub exit_day: NaiveDate,
    /// P&L before commission
    pub gross_pnl: Cash,
    /// Round-trip commission, always <= 0
    pub commission: Cash,
    /// gross_pnl + commission
    pub net_pnl: Cash,
    /// Net P&L as a percentage of account equity at entry (0 when unknown)
    pub pnl_pct_of_balance: Percentage,
    /// Sequence keys of the contributing opening fills
    pub entry_keys: Vec<SequenceKey>,
    /// Sequence keys of the contributing closing fills
    pub exit_keys: Vec<SequenceKey>,
}

impl Trade {
    /// Time held
    pub fn duration(&self) -> Duration {
        self.exited_at - self.entered_at
    }

    /// Check if the trade made money after commission
    pub fn is_win(&self) -> bool {
        self.net_pnl > 0.0
    }

    /// Check if the trade lost money after commission
    pub fn is_loss(&self) -> bool {
        self.net_pnl < 0.0
    }

    /// Replace the commission, preserving the gross component and
    /// re-deriving net P&L
    pub fn set_commission(&mut self, commission: Cash) {
        self.commission = commission;
        self.net_pnl = self.gross_pnl + commission;
    }
}
