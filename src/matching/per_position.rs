//! Per-position lifecycle matching - broker tags drive trade boundaries
//!
//! Aggregates every fill between a broker "open" tag and the fill that
//! brings the running position back to zero into a single trade. Entry and
//! exit prices are quantity-weighted averages of the opening-side and
//! closing-side fills; commission is the sum of broker-reported fees across
//! the whole lifecycle. Malformed tag sequences warn and emit best-effort
//! results instead of aborting the run.

use crate::contracts::ContractSpecs;
use crate::execution::{Execution, Lifecycle, Side};
use crate::matching::{MatchReport, MatchWarning, OpenPosition, TradeMatcher};
use crate::trade::{Direction, Trade};
use crate::types::{Quantity, QTY_EPSILON};

/// Fills accumulated for one open position lifecycle
struct Accumulator {
    direction: Direction,
    fills: Vec<usize>,
}

impl Accumulator {
    fn new(direction: Direction, first: usize) -> Self {
        Self {
            direction,
            fills: vec![first],
        }
    }

    fn opening_side(&self) -> Side {
        match self.direction {
            Direction::Long => Side::Buy,
            Direction::Short => Side::Sell,
        }
    }
}

/// Broker-reported position lifecycle matcher
pub struct PerPositionMatcher;

impl TradeMatcher for PerPositionMatcher {
    fn match_symbol(&self, executions: &[Execution], specs: &ContractSpecs) -> MatchReport {
        let mut report = MatchReport::default();
        if executions.is_empty() {
            return report;
        }

        let symbol = executions[0].symbol.clone();
        if specs.get(&symbol).is_none() {
            report.warnings.push(MatchWarning::MissingContractSpec {
                symbol: symbol.clone(),
            });
        }
        let point_value = specs.point_value(&symbol);

        let mut accum: Option<Accumulator> = None;

        for (i, exec) in executions.iter().enumerate() {
            let opens = exec.lifecycle == Some(Lifecycle::Open);

            if accum.is_none() {
                if !opens {
                    log::warn!(
                        "{}: fill {} arrived while no position was open",
                        symbol,
                        exec.sequence
                    );
                    report.warnings.push(MatchWarning::FillWhileIdle {
                        symbol: symbol.clone(),
                        sequence: exec.sequence,
                    });
                }
                accum = Some(Accumulator::new(direction_for(exec.side), i));
                continue;
            }

            if opens {
                log::warn!(
                    "{}: open tag on fill {} while a position was accumulating",
                    symbol,
                    exec.sequence
                );
                report.warnings.push(MatchWarning::OpenWhileAccumulating {
                    symbol: symbol.clone(),
                    sequence: exec.sequence,
                });
                // best effort: close out what we have, then restart
                let stale = accum.take().unwrap();
                match close_out(&stale, executions, point_value) {
                    Some(trade) => report.trades.push(trade),
                    None => residual_open(&stale, executions, &mut report),
                }
                accum = Some(Accumulator::new(direction_for(exec.side), i));
                continue;
            }

            let acc = accum.as_mut().unwrap();
            acc.fills.push(i);
            let closed =
                exec.position_qty == Some(0.0) || exec.lifecycle == Some(Lifecycle::Close);
            if closed {
                let done = accum.take().unwrap();
                if let Some(trade) = close_out(&done, executions, point_value) {
                    report.trades.push(trade);
                }
            }
        }

        // stream ended mid-lifecycle
        if let Some(acc) = accum {
            residual_open(&acc, executions, &mut report);
        }

        report
    }

    fn name(&self) -> &str {
        "PerPosition"
    }
}

fn direction_for(side: Side) -> Direction {
    match side {
        Side::Buy => Direction::Long,
        Side::Sell => Direction::Short,
    }
}

/// Quantity-weighted average price of a set of fills
fn vwap(fills: &[&Execution]) -> (Quantity, f64) {
    let quantity: Quantity = fills.iter().map(|e| e.quantity).sum();
    if quantity <= QTY_EPSILON {
        return (0.0, 0.0);
    }
    let weighted: f64 = fills.iter().map(|e| e.price * e.quantity).sum();
    (quantity, weighted / quantity)
}

/// Turn an accumulated lifecycle into one closed trade.
///
/// Returns None when no closing-side fills exist - nothing round-trip has
/// happened yet, so the accumulation is residual open inventory instead.
fn close_out(acc: &Accumulator, executions: &[Execution], point_value: f64) -> Option<Trade> {
    let opening_side = acc.opening_side();
    let opening: Vec<&Execution> = acc
        .fills
        .iter()
        .map(|&i| &executions[i])
        .filter(|e| e.side == opening_side)
        .collect();
    let closing: Vec<&Execution> = acc
        .fills
        .iter()
        .map(|&i| &executions[i])
        .filter(|e| e.side != opening_side)
        .collect();

    if opening.is_empty() || closing.is_empty() {
        return None;
    }

    let (quantity, entry_price) = vwap(&opening);
    let (_, exit_price) = vwap(&closing);
    let first = opening[0];
    let last = closing[closing.len() - 1];

    // broker P&L from the closing fill when reported, else weighted prices
    let gross = last.pnl_per_position.unwrap_or_else(|| {
        (exit_price - entry_price) * point_value * quantity * acc.direction.sign()
    });

    let commission: f64 = acc
        .fills
        .iter()
        .map(|&i| executions[i].fees.unwrap_or(0.0))
        .sum();

    Some(Trade {
        symbol: first.symbol.clone(),
        direction: acc.direction,
        quantity,
        entry_price,
        exit_price,
        entered_at: first.executed_at,
        exited_at: last.executed_at,
        entry_day: first.trading_day,
        exit_day: last.trading_day,
        gross_pnl: gross,
        commission,
        net_pnl: gross + commission,
        pnl_pct_of_balance: 0.0,
        entry_keys: opening.iter().map(|e| e.sequence).collect(),
        exit_keys: closing.iter().map(|e| e.sequence).collect(),
    })
}

/// Report an accumulation that never round-tripped as open inventory
fn residual_open(acc: &Accumulator, executions: &[Execution], report: &mut MatchReport) {
    let opening_side = acc.opening_side();
    let opening: Vec<&Execution> = acc
        .fills
        .iter()
        .map(|&i| &executions[i])
        .filter(|e| e.side == opening_side)
        .collect();
    let closed: Quantity = acc
        .fills
        .iter()
        .map(|&i| &executions[i])
        .filter(|e| e.side != opening_side)
        .map(|e| e.quantity)
        .sum();

    let (opened, entry_price) = vwap(&opening);
    let remaining = opened - closed;
    if remaining <= QTY_EPSILON || opening.is_empty() {
        return;
    }

    let symbol = opening[0].symbol.clone();
    log::warn!(
        "{}: {} contracts still open at end of stream",
        symbol,
        remaining
    );
    report.open_positions.push(OpenPosition {
        symbol: symbol.clone(),
        direction: acc.direction,
        quantity: remaining,
        entry_price,
        opened_at: opening[0].executed_at,
        sequence: opening[0].sequence,
    });
    report.warnings.push(MatchWarning::UnclosedPosition {
        symbol,
        direction: acc.direction,
        quantity: remaining,
    });
}
