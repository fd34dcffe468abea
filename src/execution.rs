//! Execution - one broker-reported fill
//!
//! An Execution is the immutable input record of the engine: a single fill
//! (partial or complete) as reported by the broker, carrying the transaction
//! sequence key that defines chronological order within its symbol.

use crate::types::{Cash, Price, Quantity, SequenceKey, Symbol, Timestamp};
use chrono::NaiveDate;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Fill side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Signed multiplier: +1 for Buy, -1 for Sell
    pub fn sign(&self) -> f64 {
        match self {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        }
    }

    /// The offsetting side
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Broker position-lifecycle tag carried on a fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Fill starts a position (flat before the fill)
    Open,
    /// Fill brings the running position back to zero
    Close,
}

/// One broker-reported fill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    /// Transaction sequence key - authoritative chronological order
    pub sequence: SequenceKey,
    /// Contract symbol (e.g. "MES", "NQ")
    pub symbol: Symbol,
    /// Fill side
    pub side: Side,
    /// Absolute fill quantity (contracts)
    pub quantity: Quantity,
    /// Signed position delta: +quantity for Buy, -quantity for Sell
    pub position_effect: f64,
    /// Execution price
    pub price: Price,
    /// Session-attributed trading day (distinct from the calendar date)
    pub trading_day: NaiveDate,
    /// Wall-clock execution time
    pub executed_at: Timestamp,
    /// Broker-reported fees, stored negative (a cost)
    #[serde(default)]
    pub fees: Option<Cash>,
    /// Broker-reported per-position P&L, present on closing fills
    #[serde(default)]
    pub pnl_per_position: Option<Cash>,
    /// Broker position-lifecycle tag
    #[serde(default)]
    pub lifecycle: Option<Lifecycle>,
    /// Running net position after this fill
    #[serde(default)]
    pub position_qty: Option<f64>,
}

impl Execution {
    /// Create a new execution; the position effect is derived from side and quantity
    pub fn new(
        sequence: SequenceKey,
        symbol: impl Into<Symbol>,
        side: Side,
        quantity: Quantity,
        price: Price,
        trading_day: NaiveDate,
        executed_at: Timestamp,
    ) -> Self {
        Self {
            sequence,
            symbol: symbol.into(),
            side,
            quantity,
            position_effect: Self::position_effect_for(side, quantity),
            price,
            trading_day,
            executed_at,
            fees: None,
            pnl_per_position: None,
            lifecycle: None,
            position_qty: None,
        }
    }

    /// Signed position delta for a side and absolute quantity
    pub fn position_effect_for(side: Side, quantity: Quantity) -> f64 {
        side.sign() * quantity.abs()
    }

    /// Attach broker-reported fees (negative, a cost)
    pub fn with_fees(mut self, fees: Cash) -> Self {
        self.fees = Some(fees);
        self
    }

    /// Attach a lifecycle tag and the running position after the fill
    pub fn with_lifecycle(mut self, tag: Lifecycle, position_qty: f64) -> Self {
        self.lifecycle = Some(tag);
        self.position_qty = Some(position_qty);
        self
    }

    /// Attach the broker-reported per-position P&L (closing fills)
    pub fn with_position_pnl(mut self, pnl: Cash) -> Self {
        self.pnl_per_position = Some(pnl);
        self
    }

    /// Check if this is a buy fill
    pub fn is_buy(&self) -> bool {
        matches!(self.side, Side::Buy)
    }

    /// Check if this is a sell fill
    pub fn is_sell(&self) -> bool {
        matches!(self.side, Side::Sell)
    }
}

/// Sort executions into chronological order by sequence key.
///
/// The sort is stable: equal sequence keys keep their original input order.
pub fn sort_chronologically(executions: &mut [Execution]) {
    executions.sort_by_key(|e| e.sequence);
}

/// Partition executions by symbol, preserving relative input order
pub fn group_by_symbol(executions: &[Execution]) -> HashMap<Symbol, Vec<Execution>> {
    let mut groups: HashMap<Symbol, Vec<Execution>> = HashMap::new();
    for exec in executions {
        groups
            .entry(exec.symbol.clone())
            .or_default()
            .push(exec.clone());
    }
    groups
}

/// Stamp running position quantities and Open/Close lifecycle tags onto a
/// stream that arrived without them.
///
/// A fill is tagged Open when its symbol was flat (or unseen) before it, and
/// Close when it brings the running position back to exactly zero. Fills in
/// the middle of a position carry no tag. Executions must already be in
/// chronological order.
pub fn annotate_lifecycle(executions: &mut [Execution]) {
    let mut positions: HashMap<Symbol, f64> = HashMap::new();
    for exec in executions.iter_mut() {
        let current = positions.get(exec.symbol.as_str()).copied();
        let new_qty = current.unwrap_or(0.0) + exec.position_effect;
        positions.insert(exec.symbol.clone(), new_qty);

        exec.position_qty = Some(new_qty);
        exec.lifecycle = if current.is_none() || current == Some(0.0) {
            Some(Lifecycle::Open)
        } else if new_qty == 0.0 {
            Some(Lifecycle::Close)
        } else {
            None
        };
    }
}
