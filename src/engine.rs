//! Reconciliation engine - groups, matches, reprices, aggregates
//!
//! The engine owns the read-only reference data (contract specs, commission
//! rates) and runs the full pipeline: partition executions by symbol, sort
//! each partition by sequence key, match with the selected strategy, then
//! run the mandatory commission second pass over the merged trade list and
//! sort the result by entry time. Symbols share no matching state, so
//! [`ReconcileEngine::reconcile_par`] fans matching out across them and fans
//! back in before the commission pass.

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::commission::{CommissionBook, CommissionSchedule};
use crate::contracts::ContractSpecs;
use crate::execution::{group_by_symbol, sort_chronologically, Execution};
use crate::matching::{MatchMethod, MatchReport};
use crate::types::{Brokerage, Cash, Symbol};

/// Account equity lookup used solely to express a trade's P&L as a
/// percentage of balance at entry.
///
/// Returning None degrades that trade to 0%, never an error. Whether the 0%
/// fallback is the right product behavior is an open question inherited from
/// the system this engine reconciles against; it is preserved as-is.
pub trait AccountEquitySource: Send + Sync {
    /// Account equity at the start of a trading day
    fn equity_on(&self, day: NaiveDate) -> Option<Cash>;
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Brokerage whose commission rates apply
    pub brokerage: Brokerage,
    /// Exit days on or after this date use the fixed commission regime
    pub tier_cutover: NaiveDate,
}

impl EngineConfig {
    /// Create a config
    pub fn new(brokerage: impl Into<Brokerage>, tier_cutover: NaiveDate) -> Self {
        Self {
            brokerage: brokerage.into(),
            tier_cutover,
        }
    }
}

/// The reconciliation engine
pub struct ReconcileEngine {
    specs: ContractSpecs,
    schedule: CommissionSchedule,
    equity: Option<Box<dyn AccountEquitySource>>,
}

impl ReconcileEngine {
    /// Create an engine from reference data and configuration
    pub fn new(specs: ContractSpecs, commissions: CommissionBook, config: EngineConfig) -> Self {
        Self {
            specs,
            schedule: CommissionSchedule::new(commissions, config.brokerage, config.tier_cutover),
            equity: None,
        }
    }

    /// Attach an account equity source for P&L-percentage-of-balance
    pub fn with_equity_source(mut self, source: Box<dyn AccountEquitySource>) -> Self {
        self.equity = Some(source);
        self
    }

    /// Reconcile an execution stream into closed trades
    pub fn reconcile(&self, executions: &[Execution], method: MatchMethod) -> MatchReport {
        self.run(executions, method, false)
    }

    /// Like [`reconcile`](Self::reconcile), with matching fanned out across
    /// symbols. Results are identical: symbols share no matching state.
    pub fn reconcile_par(&self, executions: &[Execution], method: MatchMethod) -> MatchReport {
        self.run(executions, method, true)
    }

    fn run(&self, executions: &[Execution], method: MatchMethod, parallel: bool) -> MatchReport {
        let matcher = method.matcher();
        log::debug!(
            "Reconciling {} executions ({})",
            executions.len(),
            matcher.name()
        );

        // Deterministic symbol order: matching output is merged in sorted
        // symbol order no matter what the grouping map iterates like.
        let mut groups: Vec<(Symbol, Vec<Execution>)> =
            group_by_symbol(executions).into_iter().collect();
        groups.sort_by(|a, b| a.0.cmp(&b.0));
        for (_, group) in groups.iter_mut() {
            sort_chronologically(group);
        }

        let reports: Vec<MatchReport> = if parallel {
            groups
                .par_iter()
                .map(|(_, group)| matcher.match_symbol(group, &self.specs))
                .collect()
        } else {
            groups
                .iter()
                .map(|(_, group)| matcher.match_symbol(group, &self.specs))
                .collect()
        };

        let mut report = MatchReport::default();
        for symbol_report in reports {
            report.merge(symbol_report);
        }

        // Mandatory second pass: commission depends on monthly volume over
        // the whole matched set, so it can only run after matching.
        let commission_warnings = self.schedule.apply(&mut report.trades);
        report.warnings.extend(commission_warnings);

        self.fill_balance_percentages(&mut report);

        report.trades.sort_by(|a, b| {
            a.entered_at
                .cmp(&b.entered_at)
                .then_with(|| a.entry_keys.first().cmp(&b.entry_keys.first()))
        });

        log::debug!(
            "Reconciled {} trades, {} open positions, {} warnings",
            report.trades.len(),
            report.open_positions.len(),
            report.warnings.len()
        );
        report
    }

    fn fill_balance_percentages(&self, report: &mut MatchReport) {
        let Some(source) = &self.equity else {
            return;
        };
        for trade in report.trades.iter_mut() {
            trade.pnl_pct_of_balance = match source.equity_on(trade.entry_day) {
                Some(equity) if equity > 0.0 => trade.net_pnl / equity * 100.0,
                _ => {
                    log::debug!(
                        "No account equity for {}; P&L percentage degraded to 0",
                        trade.entry_day
                    );
                    0.0
                }
            };
        }
    }
}
