//! Data access port trait.

use crate::domain::error::MtfcrossError;
use crate::domain::ohlcv::Candle;
use chrono::NaiveDateTime;

pub trait DataPort {
    /// Clean candles sorted ascending by timestamp.
    fn fetch_candles(&self) -> Result<Vec<Candle>, MtfcrossError>;

    /// First timestamp, last timestamp and candle count, or `None` when
    /// there is no data.
    fn data_range(&self) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, MtfcrossError> {
        let candles = self.fetch_candles()?;
        Ok(match (candles.first(), candles.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp, candles.len())),
            _ => None,
        })
    }
}
