//! EMA-augmented candle series.
//!
//! - `EmaPeriods`: short/long smoothing spans for one timeframe
//! - `EmaBar`: a candle with its short and long EMA values
//! - `with_emas`: augments a candle series

pub mod ema;

use std::fmt;

use crate::domain::ohlcv::Candle;
use ema::calculate_ema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmaPeriods {
    pub short: usize,
    pub long: usize,
}

impl EmaPeriods {
    pub fn new(short: usize, long: usize) -> Self {
        Self { short, long }
    }
}

impl fmt::Display for EmaPeriods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.short, self.long)
    }
}

/// A candle with its EMA values.
///
/// `None` marks a value that is absent; the engine skips bars whose values
/// are absent or non-finite.
#[derive(Debug, Clone, PartialEq)]
pub struct EmaBar {
    pub candle: Candle,
    pub ema_short: Option<f64>,
    pub ema_long: Option<f64>,
}

impl EmaBar {
    pub fn timestamp(&self) -> chrono::NaiveDateTime {
        self.candle.timestamp
    }
}

/// Compute short and long EMAs of the close price for every candle.
pub fn with_emas(candles: &[Candle], periods: EmaPeriods) -> Vec<EmaBar> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let short = calculate_ema(&closes, periods.short);
    let long = calculate_ema(&closes, periods.long);

    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| EmaBar {
            candle: candle.clone(),
            ema_short: short.get(i).copied(),
            ema_long: long.get(i).copied(),
        })
        .collect()
}
