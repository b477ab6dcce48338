//! Equity curve, per-bar returns and signal tallies.

use chrono::NaiveDateTime;

use crate::domain::position::Direction;

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub portfolio_value: f64,
    /// Lot size when a position is open after the bar, 0 otherwise.
    pub position_size: f64,
}

impl EquityPoint {
    pub fn in_market(&self) -> bool {
        self.position_size > 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarReturn {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

/// Crossover signals detected, whether or not they opened a trade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalCounts {
    pub long: usize,
    pub short: usize,
}

impl SignalCounts {
    pub fn record(&mut self, direction: Direction) {
        match direction {
            Direction::Long => self.long += 1,
            Direction::Short => self.short += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.long + self.short
    }
}

/// Running peak-to-current decline per point, as a fraction of the peak.
pub fn drawdowns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    equity_curve
        .iter()
        .map(|point| {
            peak = peak.max(point.portfolio_value);
            if peak > 0.0 {
                (peak - point.portfolio_value) / peak
            } else {
                0.0
            }
        })
        .collect()
}
