//! Strategy parameters and series preparation.

use tracing::debug;

use crate::domain::indicator::{EmaBar, EmaPeriods, with_emas};
use crate::domain::ohlcv::Candle;
use crate::domain::resample::resample;
use crate::domain::timeframe::Timeframe;

pub const DEFAULT_NAME: &str = "Multi-Timeframe EMA Crossover";

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub name: String,
    /// Entry timeframe.
    pub lower_timeframe: Timeframe,
    /// Trend filter timeframe.
    pub higher_timeframe: Timeframe,
    pub lower_emas: EmaPeriods,
    pub higher_emas: EmaPeriods,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy {
            name: DEFAULT_NAME.to_string(),
            lower_timeframe: Timeframe::default_lower(),
            higher_timeframe: Timeframe::default_higher(),
            lower_emas: EmaPeriods::new(9, 21),
            higher_emas: EmaPeriods::new(9, 21),
        }
    }
}

/// Both timeframes resampled and augmented with their EMAs.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSeries {
    pub lower: Vec<EmaBar>,
    pub higher: Vec<EmaBar>,
}

impl Strategy {
    /// Resample `candles` to both timeframes and compute their EMAs.
    pub fn prepare(&self, candles: &[Candle]) -> PreparedSeries {
        let lower = self.lower_series(candles);
        let higher = self.higher_series(candles);
        debug!(
            lower_timeframe = %self.lower_timeframe,
            lower_bars = lower.len(),
            higher_timeframe = %self.higher_timeframe,
            higher_bars = higher.len(),
            "series prepared"
        );
        PreparedSeries { lower, higher }
    }

    /// Entry series: `candles` on the lower timeframe with the lower EMAs.
    pub fn lower_series(&self, candles: &[Candle]) -> Vec<EmaBar> {
        with_emas(&resample(candles, &self.lower_timeframe), self.lower_emas)
    }

    /// Trend series: `candles` on the higher timeframe with the higher EMAs.
    pub fn higher_series(&self, candles: &[Candle]) -> Vec<EmaBar> {
        with_emas(&resample(candles, &self.higher_timeframe), self.higher_emas)
    }

    /// Same strategy with different lower-timeframe EMA periods.
    pub fn with_lower_emas(&self, lower_emas: EmaPeriods) -> Self {
        Strategy {
            lower_emas,
            ..self.clone()
        }
    }
}
