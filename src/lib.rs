//! # tradematch
//!
//! Reconstructs closed round-trip futures trades from a raw fill stream and
//! computes per-trade P&L, commission cost and aggregate performance
//! statistics.
//!
//! The engine is a pure, synchronous transformation: executions in, trades
//! plus statistics out. Fills are partitioned by symbol, ordered by the
//! broker's transaction sequence key, matched under one of two accounting
//! conventions (strict FIFO inventory, or broker-reported position
//! lifecycles), then repriced against a volume-tiered commission schedule in
//! a mandatory second pass.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tradematch::prelude::*;
//! use chrono::NaiveDate;
//!
//! let specs = ContractSpecs::new();
//! let commissions = CommissionBook::new();
//! let cutover = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
//!
//! let engine = ReconcileEngine::new(specs, commissions, EngineConfig::new("AMP", cutover));
//!
//! let executions: Vec<Execution> = Vec::new(); // broker fills
//! let report = engine.reconcile(&executions, MatchMethod::Fifo);
//! let metrics = compute_metrics(&report.trades, PnlBasis::Net);
//! println!("{} trades, win rate {:.1}%", metrics.total_trades, metrics.win_rate);
//! ```

pub mod commission;
pub mod contracts;
pub mod engine;
pub mod error;
pub mod execution;
pub mod matching;
pub mod metrics;
pub mod trade;
pub mod types;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::commission::{CommissionBook, CommissionSchedule, TierRates};
    pub use crate::contracts::{ContractSpec, ContractSpecs};
    pub use crate::engine::{AccountEquitySource, EngineConfig, ReconcileEngine};
    pub use crate::error::{EngineError, Result};
    pub use crate::execution::{Execution, Lifecycle, Side};
    pub use crate::matching::{MatchMethod, MatchReport, MatchWarning, OpenPosition};
    pub use crate::metrics::{compute_metrics, PnlBasis, TradingMetrics};
    pub use crate::trade::{Direction, Trade};
    pub use crate::types::*;
}
