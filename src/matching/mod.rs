//! Trade matching - turns ordered executions into closed round-trip trades
//!
//! Two strategies implement the same [`TradeMatcher`] trait: strict FIFO
//! inventory matching ([`fifo::FifoMatcher`]) and broker-tagged position
//! lifecycle aggregation ([`per_position::PerPositionMatcher`]). The caller
//! selects one via [`MatchMethod`]; the two are never mixed within one
//! derived trade set.

pub mod fifo;
pub mod per_position;

pub use fifo::FifoMatcher;
pub use per_position::PerPositionMatcher;

use crate::contracts::ContractSpecs;
use crate::execution::Execution;
use crate::trade::{Direction, Trade};
use crate::types::{Price, Quantity, SequenceKey, Symbol, Timestamp};
use serde::{Deserialize, Serialize};

/// Which matching algorithm reconstructs trades from fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMethod {
    /// Close the oldest open lot first when offsetting fills arrive
    Fifo,
    /// Aggregate an entire open-to-close lifecycle into one trade
    PerPosition,
}

impl MatchMethod {
    /// The matcher implementing this method
    pub fn matcher(&self) -> Box<dyn TradeMatcher> {
        match self {
            MatchMethod::Fifo => Box::new(FifoMatcher),
            MatchMethod::PerPosition => Box::new(PerPositionMatcher),
        }
    }
}

/// Structural anomaly observed while matching; never fatal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MatchWarning {
    /// Open inventory remained when the stream ended
    UnclosedPosition {
        symbol: Symbol,
        direction: Direction,
        quantity: Quantity,
    },
    /// A fill arrived while no position lifecycle was active
    FillWhileIdle { symbol: Symbol, sequence: SequenceKey },
    /// An Open tag arrived while a lifecycle was already accumulating
    OpenWhileAccumulating { symbol: Symbol, sequence: SequenceKey },
    /// No contract spec for the symbol; point value of 1.0 was used
    MissingContractSpec { symbol: Symbol },
    /// No commission rates for the symbol; rate of zero was used
    MissingCommissionRates { symbol: Symbol },
}

/// A position still open when the stream ended
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPosition {
    pub symbol: Symbol,
    pub direction: Direction,
    /// Remaining unmatched quantity
    pub quantity: Quantity,
    /// Price of the opening fill (volume-weighted when several contributed)
    pub entry_price: Price,
    pub opened_at: Timestamp,
    /// Sequence key of the earliest contributing fill
    pub sequence: SequenceKey,
}

/// Everything one matching run produced
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchReport {
    /// Closed round-trip trades
    pub trades: Vec<Trade>,
    /// Residual open inventory, reported rather than silently dropped
    pub open_positions: Vec<OpenPosition>,
    /// Structural anomalies and reference-data misses
    pub warnings: Vec<MatchWarning>,
}

impl MatchReport {
    /// Fold another report (typically one symbol's) into this one
    pub fn merge(&mut self, other: MatchReport) {
        self.trades.extend(other.trades);
        self.open_positions.extend(other.open_positions);
        self.warnings.extend(other.warnings);
    }
}

/// One matching strategy
pub trait TradeMatcher: Send + Sync {
    /// Match a single symbol's executions, already in chronological order
    fn match_symbol(&self, executions: &[Execution], specs: &ContractSpecs) -> MatchReport;

    /// Get strategy name
    fn name(&self) -> &str;
}
