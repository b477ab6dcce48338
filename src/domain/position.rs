//! Position tracking and the completed-trade record.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "Long"),
            Direction::Short => write!(f, "Short"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExitReason {
    NewSignal,
    TrendChange,
    StopLoss,
    TakeProfit,
}

impl ExitReason {
    pub const ALL: [ExitReason; 4] = [
        ExitReason::NewSignal,
        ExitReason::TrendChange,
        ExitReason::StopLoss,
        ExitReason::TakeProfit,
    ];
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::NewSignal => write!(f, "New Signal"),
            ExitReason::TrendChange => write!(f, "Trend Change"),
            ExitReason::StopLoss => write!(f, "Stop Loss"),
            ExitReason::TakeProfit => write!(f, "Take Profit"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_timestamp: NaiveDateTime,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub size: f64,
}

impl Position {
    /// Open a position at `entry_price` with stop-loss `risk_percent` percent
    /// away and take-profit `risk_reward_ratio` times the stop distance.
    pub fn open(
        direction: Direction,
        entry_price: f64,
        entry_timestamp: NaiveDateTime,
        size: f64,
        risk_percent: f64,
        risk_reward_ratio: f64,
    ) -> Self {
        let risk = entry_price * risk_percent / 100.0;
        let (stop_loss, take_profit) = match direction {
            Direction::Long => {
                let stop_loss = entry_price - risk;
                (stop_loss, entry_price + (entry_price - stop_loss) * risk_reward_ratio)
            }
            Direction::Short => {
                let stop_loss = entry_price + risk;
                (stop_loss, entry_price - (stop_loss - entry_price) * risk_reward_ratio)
            }
        };

        Position {
            direction,
            entry_price,
            entry_timestamp,
            stop_loss,
            take_profit,
            size,
        }
    }

    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }

    pub fn is_short(&self) -> bool {
        self.direction == Direction::Short
    }

    /// Realized PnL if closed at `exit_price`.
    pub fn pnl(&self, exit_price: f64) -> f64 {
        match self.direction {
            Direction::Long => (exit_price - self.entry_price) * self.size,
            Direction::Short => (self.entry_price - exit_price) * self.size,
        }
    }

    /// Whether a bar spanning `low..=high` touched the stop-loss.
    pub fn stop_loss_hit(&self, high: f64, low: f64) -> bool {
        match self.direction {
            Direction::Long => low <= self.stop_loss,
            Direction::Short => high >= self.stop_loss,
        }
    }

    /// Whether a bar spanning `low..=high` touched the take-profit.
    pub fn take_profit_hit(&self, high: f64, low: f64) -> bool {
        match self.direction {
            Direction::Long => high >= self.take_profit,
            Direction::Short => low <= self.take_profit,
        }
    }

    pub fn close(self, exit_price: f64, exit_timestamp: NaiveDateTime, reason: ExitReason) -> Trade {
        Trade {
            direction: self.direction,
            entry_price: self.entry_price,
            exit_price,
            pnl: self.pnl(exit_price),
            entry_timestamp: self.entry_timestamp,
            exit_timestamp,
            exit_reason: reason,
            size: self.size,
        }
    }
}

/// One completed position lifecycle. Immutable once appended to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl: f64,
    pub entry_timestamp: NaiveDateTime,
    pub exit_timestamp: NaiveDateTime,
    pub exit_reason: ExitReason,
    pub size: f64,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }
}
