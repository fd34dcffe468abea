//! Core types and constants

use chrono::{DateTime, Utc};

/// Timestamp type used throughout the library
pub type Timestamp = DateTime<Utc>;

/// Symbol identifier for contracts
pub type Symbol = String;

/// Price type (using f64 for precision)
pub type Price = f64;

/// Quantity type (contracts)
pub type Quantity = f64;

/// Money/cash type
pub type Cash = f64;

/// Percentage type (0.0 to 100.0)
pub type Percentage = f64;

/// Broker transaction sequence key.
///
/// Strictly increasing within a symbol and the sole source of truth for
/// chronological order; wall-clock timestamps can collide or arrive out of
/// order from the broker.
pub type SequenceKey = u64;

/// Brokerage identifier for commission lookups
pub type Brokerage = String;

/// Quantities below this are treated as fully consumed
pub const QTY_EPSILON: f64 = 1e-9;
