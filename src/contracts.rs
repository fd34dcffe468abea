//! Contract specifications - symbol-level reference data
//!
//! Maps a symbol to its point value (dollars per 1.0 price move) and tick
//! metadata. Loaded from the same JSON shape the broker reference file uses:
//!
//! ```json
//! { "MES": { "multiplier": 5, "tickSize": 0.25, "valuePerTick": 1.25 } }
//! ```

use crate::error::Result;
use crate::types::{Cash, Price, Symbol};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// Contract specification for one symbol
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContractSpec {
    /// Dollars per 1.0 price-unit move
    #[serde(rename = "multiplier")]
    pub point_value: f64,
    /// Minimum price increment
    #[serde(rename = "tickSize")]
    pub tick_size: f64,
    /// Dollar value of one tick
    #[serde(rename = "valuePerTick")]
    pub tick_value: f64,
}

impl ContractSpec {
    /// Create a new contract spec
    pub fn new(point_value: f64, tick_size: f64, tick_value: f64) -> Self {
        Self {
            point_value,
            tick_size,
            tick_value,
        }
    }
}

/// Lookup table of contract specifications by symbol
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractSpecs {
    #[serde(flatten)]
    specs: HashMap<Symbol, ContractSpec>,
}

impl ContractSpecs {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the JSON reference file format
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add or replace a symbol's spec
    pub fn insert(&mut self, symbol: impl Into<Symbol>, spec: ContractSpec) {
        self.specs.insert(symbol.into(), spec);
    }

    /// Look up a symbol's spec
    pub fn get(&self, symbol: &str) -> Option<&ContractSpec> {
        self.specs.get(symbol)
    }

    /// Point value for a symbol.
    ///
    /// Unknown symbols log a warning and fall back to 1.0 so a run completes
    /// with price-unit P&L instead of aborting.
    pub fn point_value(&self, symbol: &str) -> f64 {
        match self.specs.get(symbol) {
            Some(spec) => spec.point_value,
            None => {
                log::warn!("Contract spec not found for symbol: {}", symbol);
                1.0
            }
        }
    }

    /// Dollar value of one tick, if the symbol is known
    pub fn value_per_tick(&self, symbol: &str) -> Option<f64> {
        self.specs.get(symbol).map(|s| s.tick_value)
    }

    /// Minimum price increment, if the symbol is known
    pub fn tick_size(&self, symbol: &str) -> Option<f64> {
        self.specs.get(symbol).map(|s| s.tick_size)
    }

    /// Notional value of a fill: point value x price x position effect x -1.
    ///
    /// Buys consume cash (negative notional), sells release it. Unknown
    /// symbols warn and contribute zero.
    pub fn notional_value(&self, symbol: &str, price: Price, position_effect: f64) -> Cash {
        match self.specs.get(symbol) {
            Some(spec) => spec.point_value * price * position_effect * -1.0,
            None => {
                log::warn!("Contract spec not found for symbol: {}", symbol);
                0.0
            }
        }
    }
}
