//! Aggregate trade performance statistics
//!
//! A pure function over a closed-trade list: partition into winners, losers
//! and breakeven under the selected P&L convention, then derive rates,
//! averages, extrema, profit factor, expectancy and max drawdown. Empty
//! input yields an all-zero metrics object rather than division errors.

use crate::trade::Trade;
use crate::types::{Cash, Percentage};
use serde::{Deserialize, Serialize};

/// Which P&L figure statistics are computed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PnlBasis {
    /// Before commission (commission added back)
    Gross,
    /// After commission
    Net,
}

impl PnlBasis {
    /// The selected P&L figure for one trade
    pub fn pnl(&self, trade: &Trade) -> Cash {
        match self {
            PnlBasis::Gross => trade.gross_pnl,
            PnlBasis::Net => trade.net_pnl,
        }
    }
}

/// Aggregate performance metrics over a set of closed trades
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingMetrics {
    /// Total number of trades
    pub total_trades: usize,
    /// Trades with positive selected P&L
    pub winning_trades: usize,
    /// Trades with negative selected P&L
    pub losing_trades: usize,
    /// Trades with exactly zero selected P&L
    pub breakeven_trades: usize,
    /// Percentage of trades that are winners (0-100)
    pub win_rate: Percentage,
    /// Average winning trade (selected basis)
    pub avg_win: Cash,
    /// Average losing trade (selected basis, negative)
    pub avg_loss: Cash,
    /// Largest winning trade (selected basis)
    pub largest_win: Cash,
    /// Largest losing trade (selected basis, negative)
    pub largest_loss: Cash,
    /// Gross winning sum / |gross losing sum|, always on true gross figures
    pub profit_factor: f64,
    /// Average selected P&L per trade
    pub expectancy: Cash,
    /// Sum of gross P&L
    pub gross_pnl: Cash,
    /// Sum of net P&L
    pub net_pnl: Cash,
    /// Sum of commissions (<= 0)
    pub total_commission: Cash,
    /// Largest peak-to-trough decline in cumulative selected P&L
    pub max_drawdown: Cash,
    /// Max drawdown as a percentage of peak + drawdown (0-100)
    pub max_drawdown_pct: Percentage,
}

impl Default for TradingMetrics {
    fn default() -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            breakeven_trades: 0,
            win_rate: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            largest_win: 0.0,
            largest_loss: 0.0,
            profit_factor: 0.0,
            expectancy: 0.0,
            gross_pnl: 0.0,
            net_pnl: 0.0,
            total_commission: 0.0,
            max_drawdown: 0.0,
            max_drawdown_pct: 0.0,
        }
    }
}

/// Compute aggregate metrics over a trade list.
///
/// Trades are consumed in the order given; pass them sorted the way the
/// equity curve should run (the engine emits entry-time order).
pub fn compute_metrics(trades: &[Trade], basis: PnlBasis) -> TradingMetrics {
    if trades.is_empty() {
        return TradingMetrics::default();
    }

    let mut metrics = TradingMetrics {
        total_trades: trades.len(),
        ..TradingMetrics::default()
    };

    let mut win_sum = 0.0;
    let mut loss_sum = 0.0;
    for trade in trades {
        let pnl = basis.pnl(trade);
        if pnl > 0.0 {
            metrics.winning_trades += 1;
            win_sum += pnl;
            metrics.largest_win = metrics.largest_win.max(pnl);
        } else if pnl < 0.0 {
            metrics.losing_trades += 1;
            loss_sum += pnl;
            metrics.largest_loss = metrics.largest_loss.min(pnl);
        } else {
            metrics.breakeven_trades += 1;
        }

        metrics.gross_pnl += trade.gross_pnl;
        metrics.net_pnl += trade.net_pnl;
        metrics.total_commission += trade.commission;
    }

    metrics.win_rate = metrics.winning_trades as f64 / metrics.total_trades as f64 * 100.0;
    if metrics.winning_trades > 0 {
        metrics.avg_win = win_sum / metrics.winning_trades as f64;
    }
    if metrics.losing_trades > 0 {
        metrics.avg_loss = loss_sum / metrics.losing_trades as f64;
    }

    metrics.profit_factor = profit_factor(trades);

    let selected_total: f64 = trades.iter().map(|t| basis.pnl(t)).sum();
    metrics.expectancy = selected_total / metrics.total_trades as f64;

    let (max_dd, max_dd_pct) = max_drawdown(trades, basis);
    metrics.max_drawdown = max_dd;
    metrics.max_drawdown_pct = max_dd_pct;

    metrics
}

/// Profit factor on true gross figures, whatever the display basis.
///
/// 0 with no winners; +inf with winners and zero gross losses.
fn profit_factor(trades: &[Trade]) -> f64 {
    let gross_profit: f64 = trades
        .iter()
        .map(|t| t.gross_pnl)
        .filter(|pnl| *pnl > 0.0)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .map(|t| t.gross_pnl)
        .filter(|pnl| *pnl < 0.0)
        .map(f64::abs)
        .sum();

    if gross_loss == 0.0 {
        if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        gross_profit / gross_loss
    }
}

/// Single forward pass over cumulative selected P&L tracking the running
/// peak and the widest peak-to-trough gap
fn max_drawdown(trades: &[Trade], basis: PnlBasis) -> (Cash, Percentage) {
    let mut cumulative = 0.0;
    let mut peak = 0.0;
    let mut max_dd = 0.0;
    let mut peak_at_max = 0.0;

    for trade in trades {
        cumulative += basis.pnl(trade);
        if cumulative > peak {
            peak = cumulative;
        }
        let drawdown = peak - cumulative;
        if drawdown > max_dd {
            max_dd = drawdown;
            peak_at_max = peak;
        }
    }

    let pct = if max_dd > 0.0 && peak_at_max + max_dd > 0.0 {
        max_dd / (peak_at_max + max_dd) * 100.0
    } else {
        0.0
    };
    (max_dd, pct)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::Direction;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn trade(gross: f64, commission: f64) -> Trade {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        Trade {
            symbol: "MES".to_string(),
            direction: Direction::Long,
            quantity: 1.0,
            entry_price: 100.0,
            exit_price: 101.0,
            entered_at: Utc.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap(),
            exited_at: Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap(),
            entry_day: day,
            exit_day: day,
            gross_pnl: gross,
            commission,
            net_pnl: gross + commission,
            pnl_pct_of_balance: 0.0,
            entry_keys: vec![1],
            exit_keys: vec![2],
        }
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let metrics = compute_metrics(&[], PnlBasis::Net);
        assert_eq!(metrics, TradingMetrics::default());
    }

    #[test]
    fn test_partition_and_rates() {
        let trades = vec![
            trade(100.0, -2.0),
            trade(50.0, -2.0),
            trade(-30.0, -2.0),
            trade(2.0, -2.0), // breakeven on net
        ];
        let metrics = compute_metrics(&trades, PnlBasis::Net);

        assert_eq!(metrics.total_trades, 4);
        assert_eq!(metrics.winning_trades, 2);
        assert_eq!(metrics.losing_trades, 1);
        assert_eq!(metrics.breakeven_trades, 1);
        assert_eq!(metrics.win_rate, 50.0);
        assert_eq!(metrics.avg_win, 73.0); // (98 + 48) / 2
        assert_eq!(metrics.avg_loss, -32.0);
        assert_eq!(metrics.largest_win, 98.0);
        assert_eq!(metrics.largest_loss, -32.0);
        assert_eq!(metrics.total_commission, -8.0);
    }

    #[test]
    fn test_basis_changes_partition() {
        // loses only because of commission
        let trades = vec![trade(1.0, -2.0)];

        let net = compute_metrics(&trades, PnlBasis::Net);
        assert_eq!(net.losing_trades, 1);

        let gross = compute_metrics(&trades, PnlBasis::Gross);
        assert_eq!(gross.winning_trades, 1);
    }

    #[test]
    fn test_profit_factor_ignores_basis() {
        // gross: +100 and -50 -> profit factor 2 on either basis
        let trades = vec![trade(100.0, -200.0), trade(-50.0, -1.0)];

        let net = compute_metrics(&trades, PnlBasis::Net);
        let gross = compute_metrics(&trades, PnlBasis::Gross);
        assert_eq!(net.profit_factor, 2.0);
        assert_eq!(gross.profit_factor, 2.0);
    }

    #[test]
    fn test_profit_factor_bounds() {
        // no losses, wins exist: +inf
        let winners = vec![trade(100.0, -1.0)];
        assert!(compute_metrics(&winners, PnlBasis::Net)
            .profit_factor
            .is_infinite());

        // no wins, no losses: 0
        let flat = vec![trade(0.0, 0.0)];
        assert_eq!(compute_metrics(&flat, PnlBasis::Net).profit_factor, 0.0);

        // losses only: 0
        let losers = vec![trade(-100.0, -1.0)];
        assert_eq!(compute_metrics(&losers, PnlBasis::Net).profit_factor, 0.0);
    }

    #[test]
    fn test_expectancy() {
        let trades = vec![trade(100.0, 0.0), trade(-40.0, 0.0)];
        let metrics = compute_metrics(&trades, PnlBasis::Net);
        assert_eq!(metrics.expectancy, 30.0);
    }

    #[test]
    fn test_max_drawdown() {
        // equity: 100, 300, 150, 50, 200 -> peak 300, trough 50
        let trades = vec![
            trade(100.0, 0.0),
            trade(200.0, 0.0),
            trade(-150.0, 0.0),
            trade(-100.0, 0.0),
            trade(150.0, 0.0),
        ];
        let metrics = compute_metrics(&trades, PnlBasis::Net);

        assert_eq!(metrics.max_drawdown, 250.0);
        // peak at max drawdown was 300: 250 / (300 + 250) * 100
        let expected_pct = 250.0 / 550.0 * 100.0;
        assert_eq!(metrics.max_drawdown_pct, expected_pct);
    }

    #[test]
    fn test_drawdown_from_losing_start() {
        let trades = vec![trade(-100.0, 0.0)];
        let metrics = compute_metrics(&trades, PnlBasis::Net);

        assert_eq!(metrics.max_drawdown, 100.0);
        assert_eq!(metrics.max_drawdown_pct, 100.0); // never made a peak
    }
}
