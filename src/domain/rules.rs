//! Per-bar decision table.
//!
//! Rules are evaluated in [`DECISION_TABLE`] order and the first rule that
//! produces an action wins, so at most one action happens per bar:
//!
//! 1. `LongEntry`: short EMA crosses above long EMA while the higher timeframe is bullish
//! 2. `ShortEntry`: short EMA crosses below long EMA while the higher timeframe is bearish
//! 3. `TrendReversal`: the higher timeframe turns against the open position
//! 4. `LongStopTake`: a long position's stop-loss or take-profit was touched
//! 5. `ShortStopTake`: a short position's stop-loss or take-profit was touched
//!
//! Entries may replace an open position. The other rules only close. A
//! trend reversal wins over a stop touched on the same bar, and a stop wins
//! over a take-profit touched on the same bar.

use chrono::NaiveDateTime;

use crate::domain::position::{Direction, ExitReason, Position};
use crate::domain::trend::Trend;

/// Numeric inputs of one bar, already validated as finite.
#[derive(Debug, Clone, PartialEq)]
pub struct BarView {
    pub timestamp: NaiveDateTime,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub ema_short: f64,
    pub ema_long: f64,
    pub prev_ema_short: f64,
    pub prev_ema_long: f64,
}

impl BarView {
    pub fn crossed_above(&self) -> bool {
        self.prev_ema_short <= self.prev_ema_long && self.ema_short > self.ema_long
    }

    pub fn crossed_below(&self) -> bool {
        self.prev_ema_short >= self.prev_ema_long && self.ema_short < self.ema_long
    }
}

pub struct RuleContext<'a> {
    pub bar: &'a BarView,
    pub trend: Trend,
    pub position: Option<&'a Position>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Close any open position at the bar close, then open in this direction.
    Enter(Direction),
    /// Close the open position at `price`.
    Exit { price: f64, reason: ExitReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    LongEntry,
    ShortEntry,
    TrendReversal,
    LongStopTake,
    ShortStopTake,
}

pub const DECISION_TABLE: [Rule; 5] = [
    Rule::LongEntry,
    Rule::ShortEntry,
    Rule::TrendReversal,
    Rule::LongStopTake,
    Rule::ShortStopTake,
];

impl Rule {
    pub fn evaluate(self, ctx: &RuleContext) -> Option<Action> {
        match self {
            Rule::LongEntry => (ctx.bar.crossed_above() && ctx.trend == Trend::Bullish)
                .then_some(Action::Enter(Direction::Long)),
            Rule::ShortEntry => (ctx.bar.crossed_below() && ctx.trend == Trend::Bearish)
                .then_some(Action::Enter(Direction::Short)),
            Rule::TrendReversal => {
                let position = ctx.position?;
                let against = matches!(
                    (position.direction, ctx.trend),
                    (Direction::Long, Trend::Bearish) | (Direction::Short, Trend::Bullish)
                );
                against.then_some(Action::Exit {
                    price: ctx.bar.close,
                    reason: ExitReason::TrendChange,
                })
            }
            Rule::LongStopTake => ctx
                .position
                .filter(|p| p.is_long())
                .and_then(|p| stop_or_take(p, ctx.bar)),
            Rule::ShortStopTake => ctx
                .position
                .filter(|p| p.is_short())
                .and_then(|p| stop_or_take(p, ctx.bar)),
        }
    }
}

fn stop_or_take(position: &Position, bar: &BarView) -> Option<Action> {
    if position.stop_loss_hit(bar.high, bar.low) {
        Some(Action::Exit {
            price: position.stop_loss,
            reason: ExitReason::StopLoss,
        })
    } else if position.take_profit_hit(bar.high, bar.low) {
        Some(Action::Exit {
            price: position.take_profit,
            reason: ExitReason::TakeProfit,
        })
    } else {
        None
    }
}

/// First matching rule and its action, if any.
pub fn decide(ctx: &RuleContext) -> Option<(Rule, Action)> {
    DECISION_TABLE
        .iter()
        .find_map(|&rule| rule.evaluate(ctx).map(|action| (rule, action)))
}
