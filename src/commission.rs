//! Commission schedule and the post-match repricing pass
//!
//! Rates come from the brokerage reference file, keyed brokerage -> symbol
//! -> four per-side tiers bucketed by monthly contract volume:
//!
//! ```json
//! { "AMP": { "rates": { "MES": { "tiers": { "1": 0.62, "2": 1.20, "3": 1.55, "4": 2.05 } } } } }
//! ```
//!
//! Commission depends on trailing monthly volume, which is only knowable
//! once every trade for the period is matched - hence [`CommissionSchedule::apply`]
//! runs as a second pass over the already-matched trade list, whichever
//! matching algorithm produced it.

use crate::error::Result;
use crate::matching::MatchWarning;
use crate::trade::Trade;
use crate::types::{Brokerage, Quantity, Symbol};
use chrono::{Datelike, NaiveDate};
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

/// Brokerage identifier used when none is configured
pub const DEFAULT_BROKERAGE: &str = "AMP";

/// Per-side dollar rates for the four monthly-volume tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierRates {
    /// Under 1,000 contracts/month
    #[serde(rename = "1")]
    pub tier1: f64,
    /// 1,000 to 4,999
    #[serde(rename = "2")]
    pub tier2: f64,
    /// 5,000 to 9,999
    #[serde(rename = "3")]
    pub tier3: f64,
    /// 10,000 and above
    #[serde(rename = "4")]
    pub tier4: f64,
}

impl TierRates {
    /// Create tier rates
    pub fn new(tier1: f64, tier2: f64, tier3: f64, tier4: f64) -> Self {
        Self {
            tier1,
            tier2,
            tier3,
            tier4,
        }
    }

    /// The same rate at every volume level
    pub fn flat(rate: f64) -> Self {
        Self::new(rate, rate, rate, rate)
    }

    /// Per-side rate for a month's accumulated contract volume
    pub fn for_volume(&self, volume: Quantity) -> f64 {
        if volume < 1_000.0 {
            self.tier1
        } else if volume < 5_000.0 {
            self.tier2
        } else if volume < 10_000.0 {
            self.tier3
        } else {
            self.tier4
        }
    }

    /// Per-side rate under the fixed regime (tier 3 unconditionally)
    pub fn fixed(&self) -> f64 {
        self.tier3
    }
}

/// Commission rates for one symbol
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymbolCommission {
    pub tiers: TierRates,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct BrokerRates {
    rates: HashMap<Symbol, SymbolCommission>,
}

/// Commission reference data: brokerage -> symbol -> tier rates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommissionBook {
    #[serde(flatten)]
    brokers: HashMap<Brokerage, BrokerRates>,
}

impl CommissionBook {
    /// Create an empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the JSON reference file format
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Add or replace a symbol's tier rates under a brokerage
    pub fn insert(&mut self, brokerage: impl Into<Brokerage>, symbol: impl Into<Symbol>, tiers: TierRates) {
        self.brokers
            .entry(brokerage.into())
            .or_default()
            .rates
            .insert(symbol.into(), SymbolCommission { tiers });
    }

    /// Look up tier rates for a brokerage + symbol
    pub fn tiers(&self, brokerage: &str, symbol: &str) -> Option<&TierRates> {
        self.brokers
            .get(brokerage)
            .and_then(|b| b.rates.get(symbol))
            .map(|s| &s.tiers)
    }
}

/// The commission schedule applied to matched trades.
///
/// Exit days on or after the cutover use the fixed (tier 3) regime; earlier
/// exits use the volume-tiered regime. Exactly one regime applies to any
/// given exit day.
#[derive(Debug, Clone)]
pub struct CommissionSchedule {
    book: CommissionBook,
    brokerage: Brokerage,
    cutover: NaiveDate,
}

impl CommissionSchedule {
    /// Create a schedule from a rate book, brokerage and regime cutover date
    pub fn new(book: CommissionBook, brokerage: impl Into<Brokerage>, cutover: NaiveDate) -> Self {
        Self {
            book,
            brokerage: brokerage.into(),
            cutover,
        }
    }

    /// The regime cutover date
    pub fn cutover(&self) -> NaiveDate {
        self.cutover
    }

    /// Accumulated contract volume per calendar month, over trades exiting
    /// before the cutover. Rebuilt from scratch on every pass; carrying the
    /// map across invocations would leak volume between runs.
    fn monthly_volume(&self, trades: &[Trade]) -> HashMap<(i32, u32), Quantity> {
        let mut volume: HashMap<(i32, u32), Quantity> = HashMap::new();
        for trade in trades.iter().filter(|t| t.exit_day < self.cutover) {
            *volume
                .entry((trade.exit_day.year(), trade.exit_day.month()))
                .or_insert(0.0) += trade.quantity;
        }
        volume
    }

    /// Reprice every trade from the schedule.
    ///
    /// Round-trip commission is rate x 2 sides x quantity, stored negative.
    /// Each trade keeps its gross P&L; net is re-derived. Symbols with no
    /// rates warn once and get a rate of zero so the run completes.
    pub fn apply(&self, trades: &mut [Trade]) -> Vec<MatchWarning> {
        let mut warnings = Vec::new();
        let mut missing: HashSet<Symbol> = HashSet::new();
        let volume = self.monthly_volume(trades);

        for trade in trades.iter_mut() {
            let tiers = match self.book.tiers(&self.brokerage, &trade.symbol) {
                Some(tiers) => tiers,
                None => {
                    if missing.insert(trade.symbol.clone()) {
                        log::warn!(
                            "Commission rates not found for symbol: {}",
                            trade.symbol
                        );
                        warnings.push(MatchWarning::MissingCommissionRates {
                            symbol: trade.symbol.clone(),
                        });
                    }
                    trade.set_commission(0.0);
                    continue;
                }
            };

            let rate = if trade.exit_day >= self.cutover {
                tiers.fixed()
            } else {
                let month = (trade.exit_day.year(), trade.exit_day.month());
                tiers.for_volume(volume.get(&month).copied().unwrap_or(0.0))
            };

            trade.set_commission(-(rate * 2.0 * trade.quantity));
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::Direction;
    use chrono::{TimeZone, Utc};

    fn book() -> CommissionBook {
        let mut book = CommissionBook::new();
        book.insert("AMP", "Y", TierRates::new(0.62, 1.20, 1.55, 2.05));
        book
    }

    fn trade_exiting(exit_day: NaiveDate, quantity: f64, gross: f64) -> Trade {
        Trade {
            symbol: "Y".to_string(),
            direction: Direction::Long,
            quantity,
            entry_price: 100.0,
            exit_price: 101.0,
            entered_at: Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap(),
            exited_at: Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap(),
            entry_day: exit_day,
            exit_day,
            gross_pnl: gross,
            commission: 0.0,
            net_pnl: gross,
            pnl_pct_of_balance: 0.0,
            entry_keys: vec![1],
            exit_keys: vec![2],
        }
    }

    #[test]
    fn test_tier_bucketing() {
        let tiers = TierRates::new(0.62, 1.20, 1.55, 2.05);
        assert_eq!(tiers.for_volume(0.0), 0.62);
        assert_eq!(tiers.for_volume(999.0), 0.62);
        assert_eq!(tiers.for_volume(1_200.0), 1.20);
        assert_eq!(tiers.for_volume(5_000.0), 1.55);
        assert_eq!(tiers.for_volume(25_000.0), 2.05);
        assert_eq!(tiers.fixed(), 1.55);
    }

    #[test]
    fn test_tiered_regime_uses_monthly_volume() {
        let cutover = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let schedule = CommissionSchedule::new(book(), "AMP", cutover);

        // 1,200 contracts in one pre-cutover month lands in tier 2
        let exit = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let mut trades: Vec<Trade> = (0..1_200).map(|_| trade_exiting(exit, 1.0, 60.0)).collect();
        let warnings = schedule.apply(&mut trades);

        assert!(warnings.is_empty());
        // round trip on a 1-lot: -(1.20 * 2 * 1)
        assert_eq!(trades[0].commission, -2.40);
        assert_eq!(trades[0].net_pnl, 57.60);
    }

    #[test]
    fn test_fixed_regime_after_cutover() {
        let cutover = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let schedule = CommissionSchedule::new(book(), "AMP", cutover);

        // huge volume, but the exit is post-cutover: tier 3 unconditionally
        let exit = NaiveDate::from_ymd_opt(2025, 2, 3).unwrap();
        let mut trades: Vec<Trade> = (0..20_000).map(|_| trade_exiting(exit, 1.0, 10.0)).collect();
        schedule.apply(&mut trades);

        assert_eq!(trades[0].commission, -3.10); // 1.55 * 2 * 1
    }

    #[test]
    fn test_volume_rebuilt_between_passes() {
        let cutover = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let schedule = CommissionSchedule::new(book(), "AMP", cutover);

        let exit = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let mut trades = vec![trade_exiting(exit, 10.0, 60.0)];
        schedule.apply(&mut trades);
        let first = trades[0].commission;
        // a repeated pass over the same trades must not see doubled volume
        schedule.apply(&mut trades);

        assert_eq!(trades[0].commission, first);
        assert_eq!(trades[0].commission, -(0.62 * 2.0 * 10.0));
    }

    #[test]
    fn test_missing_rates_warn_and_zero() {
        let cutover = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let schedule = CommissionSchedule::new(CommissionBook::new(), "AMP", cutover);

        let exit = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let mut trades = vec![
            trade_exiting(exit, 1.0, 60.0),
            trade_exiting(exit, 1.0, 40.0),
        ];
        let warnings = schedule.apply(&mut trades);

        // one warning per symbol, not per trade
        assert_eq!(
            warnings,
            vec![MatchWarning::MissingCommissionRates {
                symbol: "Y".to_string()
            }]
        );
        assert_eq!(trades[0].commission, 0.0);
        assert_eq!(trades[0].net_pnl, 60.0);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "AMP": { "rates": { "MES": { "tiers": { "1": 0.62, "2": 1.20, "3": 1.55, "4": 2.05 } } } }
        }"#;
        let book = CommissionBook::from_json(json).unwrap();

        let tiers = book.tiers("AMP", "MES").unwrap();
        assert_eq!(tiers.tier2, 1.20);
        assert!(book.tiers("AMP", "NQ").is_none());
        assert!(book.tiers("IB", "MES").is_none());
    }
}
