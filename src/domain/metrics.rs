//! Performance metrics computed from a backtest result.

use chrono::Duration;

use super::backtest::BacktestResult;
use super::equity::drawdowns;
use super::position::{Direction, ExitReason, Trade};

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_trades: usize,
    /// Percentage of trades with positive PnL.
    pub win_rate: f64,
    pub total_profit: f64,
    pub avg_profit: f64,
    pub profitable_trades: usize,
    /// Trades with PnL <= 0.
    pub losing_trades: usize,
    pub profit_from_winners: f64,
    pub loss_from_losers: f64,
    pub returns_from_winners: f64,
    pub returns_from_losers: f64,
    pub num_long_trades: usize,
    pub num_short_trades: usize,
    pub long_signals: usize,
    pub short_signals: usize,
    pub total_signals: usize,
    pub profit_factor: f64,
    pub final_capital: f64,
    pub total_return_pct: f64,
    /// Largest peak-to-trough decline, in percent.
    pub max_drawdown: f64,
    /// Mean interval between consecutive trade exits.
    pub avg_trade_gap: Option<Duration>,
    pub total_days: f64,
    pub days_in_market: i64,
    pub days_in_market_pct: f64,
    pub time_in_market_pct: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub win_loss_ratio: f64,
    pub calendar_days: i64,
    pub annualized_return: f64,
    pub max_win_streak: usize,
    pub max_loss_streak: usize,
    /// Exit reason counts, most frequent first.
    pub exit_reasons: Vec<(ExitReason, usize)>,
}

impl Metrics {
    pub fn compute(result: &BacktestResult, initial_capital: f64) -> Self {
        let trades = &result.trades;
        let curve = &result.equity_curve;

        let total_trades = trades.len();
        let total_profit: f64 = trades.iter().map(|t| t.pnl).sum();
        let avg_profit = mean_or_zero(total_profit, total_trades);

        let winners: Vec<f64> = trades.iter().filter(|t| t.is_win()).map(|t| t.pnl).collect();
        let losers: Vec<f64> = trades.iter().filter(|t| !t.is_win()).map(|t| t.pnl).collect();
        let profit_from_winners: f64 = winners.iter().sum();
        let loss_from_losers: f64 = losers.iter().sum();

        let win_rate = if total_trades > 0 {
            winners.len() as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let (returns_from_winners, returns_from_losers) = if initial_capital > 0.0 {
            (
                profit_from_winners / initial_capital * 100.0,
                loss_from_losers / initial_capital * 100.0,
            )
        } else {
            (0.0, 0.0)
        };

        let profit_factor = if loss_from_losers < 0.0 {
            profit_from_winners / loss_from_losers.abs()
        } else {
            f64::INFINITY
        };

        let final_capital = result.final_capital();
        let total_return_pct = if initial_capital != 0.0 {
            (final_capital - initial_capital) / initial_capital * 100.0
        } else {
            0.0
        };

        let max_drawdown = drawdowns(curve).into_iter().fold(0.0_f64, f64::max) * 100.0;

        let (total_days, calendar_days) = match (curve.first(), curve.last()) {
            (Some(first), Some(last)) => {
                let span = last.timestamp - first.timestamp;
                (span.num_seconds() as f64 / 86_400.0, span.num_days())
            }
            _ => (0.0, 0),
        };

        let in_market: Vec<_> = curve.iter().filter(|p| p.in_market()).collect();
        let days_in_market = match (in_market.first(), in_market.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_days(),
            _ => 0,
        };
        let days_in_market_pct = if total_days > 0.0 {
            days_in_market as f64 / total_days * 100.0
        } else {
            0.0
        };
        let time_in_market_pct = if curve.is_empty() {
            0.0
        } else {
            in_market.len() as f64 / curve.len() as f64 * 100.0
        };

        let avg_win = mean_or_zero(profit_from_winners, winners.len());
        let avg_loss = mean_or_zero(loss_from_losers, losers.len());
        let win_loss_ratio = if avg_loss != 0.0 {
            (avg_win / avg_loss).abs()
        } else {
            f64::INFINITY
        };

        let annualized_return = if calendar_days > 0 && initial_capital > 0.0 {
            ((final_capital / initial_capital).powf(365.0 / calendar_days as f64) - 1.0) * 100.0
        } else {
            0.0
        };

        let (max_win_streak, max_loss_streak) = streaks(trades);

        Metrics {
            total_trades,
            win_rate,
            total_profit,
            avg_profit,
            profitable_trades: winners.len(),
            losing_trades: losers.len(),
            profit_from_winners,
            loss_from_losers,
            returns_from_winners,
            returns_from_losers,
            num_long_trades: count_direction(trades, Direction::Long),
            num_short_trades: count_direction(trades, Direction::Short),
            long_signals: result.signal_counts.long,
            short_signals: result.signal_counts.short,
            total_signals: result.signal_counts.total(),
            profit_factor,
            final_capital,
            total_return_pct,
            max_drawdown,
            avg_trade_gap: avg_trade_gap(trades),
            total_days,
            days_in_market,
            days_in_market_pct,
            time_in_market_pct,
            avg_win,
            avg_loss,
            win_loss_ratio,
            calendar_days,
            annualized_return,
            max_win_streak,
            max_loss_streak,
            exit_reasons: exit_reason_counts(trades),
        }
    }
}

fn mean_or_zero(sum: f64, count: usize) -> f64 {
    if count > 0 { sum / count as f64 } else { 0.0 }
}

fn count_direction(trades: &[Trade], direction: Direction) -> usize {
    trades.iter().filter(|t| t.direction == direction).count()
}

fn avg_trade_gap(trades: &[Trade]) -> Option<Duration> {
    if trades.len() < 2 {
        return None;
    }
    let total: Duration = trades
        .windows(2)
        .map(|w| w[1].exit_timestamp - w[0].exit_timestamp)
        .fold(Duration::zero(), |acc, gap| acc + gap);
    Some(total / (trades.len() as i32 - 1))
}

fn streaks(trades: &[Trade]) -> (usize, usize) {
    let (mut win, mut loss) = (0usize, 0usize);
    let (mut max_win, mut max_loss) = (0usize, 0usize);
    for trade in trades {
        if trade.is_win() {
            win += 1;
            loss = 0;
            max_win = max_win.max(win);
        } else {
            loss += 1;
            win = 0;
            max_loss = max_loss.max(loss);
        }
    }
    (max_win, max_loss)
}

fn exit_reason_counts(trades: &[Trade]) -> Vec<(ExitReason, usize)> {
    let mut counts: Vec<(ExitReason, usize)> = ExitReason::ALL
        .iter()
        .map(|&reason| {
            let n = trades.iter().filter(|t| t.exit_reason == reason).count();
            (reason, n)
        })
        .filter(|&(_, n)| n > 0)
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    counts
}
