//! Higher-timeframe trend classification.

use chrono::NaiveDateTime;
use std::fmt;

use crate::domain::indicator::EmaBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

impl Trend {
    /// Classify a pair of EMA values. Absent or NaN values are neither
    /// greater nor less than each other, so they classify as `Neutral`.
    pub fn classify(ema_short: Option<f64>, ema_long: Option<f64>) -> Self {
        match (ema_short, ema_long) {
            (Some(short), Some(long)) if short > long => Trend::Bullish,
            (Some(short), Some(long)) if short < long => Trend::Bearish,
            _ => Trend::Neutral,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "Bullish"),
            Trend::Bearish => write!(f, "Bearish"),
            Trend::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Trend of the most recent bar with `timestamp <= at` (as-of lookup).
///
/// `series` must be sorted ascending by timestamp. O(log n).
pub fn trend_at(series: &[EmaBar], at: NaiveDateTime) -> Trend {
    let idx = series.partition_point(|bar| bar.timestamp() <= at);
    if idx == 0 {
        return Trend::Neutral;
    }
    let bar = &series[idx - 1];
    Trend::classify(bar.ema_short, bar.ema_long)
}
