//! Backtest engine.
//!
//! Walks the lower-timeframe series bar by bar, consults the higher-timeframe
//! trend as of each bar, and applies the [decision table](crate::domain::rules)
//! to a single exclusive position.
//!
//! Per bar (index >= 1; bar 0 only seeds the equity curve):
//! 1. Extract high/low/close and current/previous EMAs. Any absent or
//!    non-finite value skips the bar: no equity point, no trade, no state change.
//! 2. Look up the higher-timeframe trend as of the bar timestamp.
//! 3. Apply the first matching rule.
//! 4. Append an equity point (capital after this bar, lot size if a position
//!    is open after this bar) and the bar return (`pnl / (capital - pnl)` when
//!    a trade closed, 0 otherwise).
//!
//! A position still open after the last bar is reported, never liquidated.

use chrono::NaiveDateTime;
use std::fmt;
use tracing::{debug, info, warn};

use crate::domain::equity::{BarReturn, EquityPoint, SignalCounts};
use crate::domain::indicator::EmaBar;
use crate::domain::position::{ExitReason, Position, Trade};
use crate::domain::rules::{Action, BarView, RuleContext, decide};
use crate::domain::trend::trend_at;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub lot_size: f64,
    /// Stop-loss distance in percentage points of the entry price.
    pub risk_percent: f64,
    /// Take-profit distance as a multiple of the stop-loss distance.
    pub risk_reward_ratio: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 500.0,
            lot_size: 0.1,
            risk_percent: 1.0,
            risk_reward_ratio: 2.0,
        }
    }
}

/// Why a bar was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Missing(&'static str),
    NonFinite(&'static str),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Missing(field) => write!(f, "missing {}", field),
            SkipReason::NonFinite(field) => write!(f, "non-numeric {}", field),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BarOutcome {
    Processed { closed: Option<Trade> },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedBar {
    pub timestamp: NaiveDateTime,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub initial_capital: f64,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub signal_counts: SignalCounts,
    /// One entry per lower-timeframe bar, including bar 0 and skipped bars.
    pub returns: Vec<BarReturn>,
    pub skipped: Vec<SkippedBar>,
    /// Position still open after the last bar, unrealized.
    pub open_position: Option<Position>,
}

impl BacktestResult {
    /// Result of a run that had no data to walk.
    pub fn empty(initial_capital: f64) -> Self {
        BacktestResult {
            initial_capital,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            signal_counts: SignalCounts::default(),
            returns: Vec::new(),
            skipped: Vec::new(),
            open_position: None,
        }
    }

    pub fn has_trades(&self) -> bool {
        !self.trades.is_empty()
    }

    pub fn final_capital(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.portfolio_value)
            .unwrap_or(self.initial_capital)
    }

    pub fn realized_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.pnl).sum()
    }
}

/// Mutable state of one run. Owns the position exclusively.
pub struct Engine<'a> {
    config: BacktestConfig,
    higher: &'a [EmaBar],
    capital: f64,
    position: Option<Position>,
    trades: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
    signal_counts: SignalCounts,
    returns: Vec<BarReturn>,
    skipped: Vec<SkippedBar>,
}

impl<'a> Engine<'a> {
    pub fn new(config: BacktestConfig, higher: &'a [EmaBar]) -> Self {
        Engine {
            config,
            higher,
            capital: config.initial_capital,
            position: None,
            trades: Vec::new(),
            equity_curve: Vec::new(),
            signal_counts: SignalCounts::default(),
            returns: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Record the starting point: initial capital, no position.
    pub fn seed(&mut self, first: &EmaBar) {
        self.equity_curve.push(EquityPoint {
            timestamp: first.timestamp(),
            portfolio_value: self.capital,
            position_size: 0.0,
        });
        self.returns.push(BarReturn {
            timestamp: first.timestamp(),
            value: 0.0,
        });
    }

    /// Process `bar` given the bar before it.
    pub fn step(&mut self, prev: &EmaBar, bar: &EmaBar) -> BarOutcome {
        let view = match extract_view(prev, bar) {
            Ok(view) => view,
            Err(reason) => {
                warn!(timestamp = %bar.timestamp(), %reason, "skipping bar");
                self.skipped.push(SkippedBar {
                    timestamp: bar.timestamp(),
                    reason,
                });
                self.returns.push(BarReturn {
                    timestamp: bar.timestamp(),
                    value: 0.0,
                });
                return BarOutcome::Skipped(reason);
            }
        };

        let trend = trend_at(self.higher, view.timestamp);
        let decision = decide(&RuleContext {
            bar: &view,
            trend,
            position: self.position.as_ref(),
        });

        let closed = match decision {
            Some((rule, Action::Enter(direction))) => {
                debug!(timestamp = %view.timestamp, ?rule, %trend, close = view.close, "entry signal");
                self.signal_counts.record(direction);
                let closed = self.close_position(view.close, view.timestamp, ExitReason::NewSignal);
                self.position = Some(Position::open(
                    direction,
                    view.close,
                    view.timestamp,
                    self.config.lot_size,
                    self.config.risk_percent,
                    self.config.risk_reward_ratio,
                ));
                closed
            }
            Some((rule, Action::Exit { price, reason })) => {
                debug!(timestamp = %view.timestamp, ?rule, %trend, price, "exit");
                self.close_position(price, view.timestamp, reason)
            }
            None => None,
        };

        self.equity_curve.push(EquityPoint {
            timestamp: view.timestamp,
            portfolio_value: self.capital,
            position_size: if self.position.is_some() {
                self.config.lot_size
            } else {
                0.0
            },
        });

        let value = match &closed {
            Some(trade) => {
                let before = self.capital - trade.pnl;
                if before != 0.0 { trade.pnl / before } else { 0.0 }
            }
            None => 0.0,
        };
        self.returns.push(BarReturn {
            timestamp: view.timestamp,
            value,
        });

        BarOutcome::Processed { closed }
    }

    fn close_position(
        &mut self,
        exit_price: f64,
        timestamp: NaiveDateTime,
        reason: ExitReason,
    ) -> Option<Trade> {
        let position = self.position.take()?;
        let trade = position.close(exit_price, timestamp, reason);
        self.capital += trade.pnl;
        debug!(
            direction = %trade.direction,
            entry = trade.entry_price,
            exit = trade.exit_price,
            pnl = trade.pnl,
            reason = %trade.exit_reason,
            "trade closed"
        );
        self.trades.push(trade.clone());
        Some(trade)
    }

    pub fn finish(self) -> BacktestResult {
        BacktestResult {
            initial_capital: self.config.initial_capital,
            trades: self.trades,
            equity_curve: self.equity_curve,
            signal_counts: self.signal_counts,
            returns: self.returns,
            skipped: self.skipped,
            open_position: self.position,
        }
    }
}

fn required(value: Option<f64>, field: &'static str) -> Result<f64, SkipReason> {
    match value {
        None => Err(SkipReason::Missing(field)),
        Some(v) if !v.is_finite() => Err(SkipReason::NonFinite(field)),
        Some(v) => Ok(v),
    }
}

fn extract_view(prev: &EmaBar, bar: &EmaBar) -> Result<BarView, SkipReason> {
    Ok(BarView {
        timestamp: bar.timestamp(),
        high: required(Some(bar.candle.high), "high")?,
        low: required(Some(bar.candle.low), "low")?,
        close: required(Some(bar.candle.close), "close")?,
        ema_short: required(bar.ema_short, "ema_short")?,
        ema_long: required(bar.ema_long, "ema_long")?,
        prev_ema_short: required(prev.ema_short, "previous ema_short")?,
        prev_ema_long: required(prev.ema_long, "previous ema_long")?,
    })
}

/// Run the strategy over `lower`, reading trend from `higher`.
///
/// Both series must be sorted ascending by timestamp. An empty series gives
/// an empty result rather than an error.
pub fn run_backtest(lower: &[EmaBar], higher: &[EmaBar], config: &BacktestConfig) -> BacktestResult {
    let Some(first) = lower.first() else {
        warn!("cannot run backtest: lower timeframe series is empty");
        return BacktestResult::empty(config.initial_capital);
    };
    if higher.is_empty() {
        warn!("cannot run backtest: higher timeframe series is empty");
        return BacktestResult::empty(config.initial_capital);
    }

    info!(
        lower_bars = lower.len(),
        higher_bars = higher.len(),
        initial_capital = config.initial_capital,
        "running backtest"
    );

    let mut engine = Engine::new(*config, higher);
    engine.seed(first);
    for pair in lower.windows(2) {
        engine.step(&pair[0], &pair[1]);
    }
    let result = engine.finish();

    info!(
        trades = result.trades.len(),
        skipped = result.skipped.len(),
        final_capital = result.final_capital(),
        "backtest complete"
    );
    result
}
