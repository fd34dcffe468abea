//! FIFO inventory matching - the oldest open lot closes first
//!
//! Keeps an ordered queue of open lots per symbol. A fill extending the net
//! position pushes a lot; an offsetting fill drains lots from the front,
//! emitting one closed trade slice per dequeue. Closing more than the open
//! inventory flips the position: the excess becomes a fresh opposite-side
//! lot instead of an error.

use std::collections::VecDeque;

use crate::contracts::ContractSpecs;
use crate::execution::{Execution, Side};
use crate::matching::{MatchReport, MatchWarning, OpenPosition, TradeMatcher};
use crate::trade::{Direction, Trade};
use crate::types::{Quantity, QTY_EPSILON};

/// An open lot: index into the execution arena plus remaining quantity
struct Lot {
    exec: usize,
    remaining: Quantity,
}

/// Strict FIFO inventory matcher
pub struct FifoMatcher;

impl TradeMatcher for FifoMatcher {
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

        let mut queue: VecDeque<Lot> = VecDeque::new();
        let mut queue_side = executions[0].side;

        for (i, exec) in executions.iter().enumerate() {
            if queue.is_empty() || exec.side == queue_side {
                queue.push_back(Lot {
                    exec: i,
                    remaining: exec.quantity,
                });
                queue_side = exec.side;
                continue;
            }

            // Offsetting fill: drain the oldest lots first
            let mut to_close = exec.quantity;
            while to_close > QTY_EPSILON {
                match queue.front_mut() {
                    Some(lot) => {
                        let matched = to_close.min(lot.remaining);
                        let entry = &executions[lot.exec];
                        report
                            .trades
                            .push(close_slice(entry, exec, matched, point_value));
                        lot.remaining -= matched;
                        to_close -= matched;
                        if lot.remaining <= QTY_EPSILON {
                            queue.pop_front();
                        }
                    }
                    None => {
                        // Flip: the excess opens a new opposite-side lot
                        queue.push_back(Lot {
                            exec: i,
                            remaining: to_close,
                        });
                        queue_side = exec.side;
                        to_close = 0.0;
                    }
                }
            }
        }

        // Whatever is still queued is genuinely open inventory
        if !queue.is_empty() {
            let direction = direction_for(queue_side);
            let residual: Quantity = queue.iter().map(|lot| lot.remaining).sum();
            for lot in &queue {
                let entry = &executions[lot.exec];
                report.open_positions.push(OpenPosition {
                    symbol: symbol.clone(),
                    direction,
                    quantity: lot.remaining,
                    entry_price: entry.price,
                    opened_at: entry.executed_at,
                    sequence: entry.sequence,
                });
            }
            log::warn!(
                "{}: {} contracts still open at end of stream",
                symbol,
                residual
            );
            report.warnings.push(MatchWarning::UnclosedPosition {
                symbol,
                direction,
                quantity: residual,
            });
        }

        report
    }

    fn name(&self) -> &str {
        "Fifo"
    }
}

fn direction_for(open_side: Side) -> Direction {
    match open_side {
        Side::Buy => Direction::Long,
        Side::Sell => Direction::Short,
    }
}

/// Build one closed trade slice from an opening lot and the fill closing it
fn close_slice(entry: &Execution, exit: &Execution, quantity: Quantity, point_value: f64) -> Trade {
    let direction = direction_for(entry.side);
    let gross = (exit.price - entry.price) * point_value * quantity * direction.sign();

    Trade {
        symbol: entry.symbol.clone(),
        direction,
        quantity,
        entry_price: entry.price,
        exit_price: exit.price,
        entered_at: entry.executed_at,
        exited_at: exit.executed_at,
        entry_day: entry.trading_day,
        exit_day: exit.trading_day,
        gross_pnl: gross,
        commission: 0.0,
        net_pnl: gross,
        pnl_pct_of_balance: 0.0,
        entry_keys: vec![entry.sequence],
        exit_keys: vec![exit.sequence],
    }
}
