//! Fixed-interval candle aggregation.
//!
//! Windows are `[start, start + interval)`, anchored at midnight of the first
//! candle's day and labelled by their start. open=first, high=max, low=min,
//! close=last, volume=sum. Windows without source rows are dropped.

use crate::domain::ohlcv::Candle;
use crate::domain::timeframe::Timeframe;

/// Aggregate `candles` (sorted ascending by timestamp) into `timeframe` windows.
pub fn resample(candles: &[Candle], timeframe: &Timeframe) -> Vec<Candle> {
    let Some(first) = candles.first() else {
        return Vec::new();
    };
    let origin = first.timestamp;

    let mut out: Vec<Candle> = Vec::new();
    for candle in candles {
        let start = timeframe.bucket_start(candle.timestamp, origin);
        match out.last_mut() {
            Some(current) if current.timestamp == start => current.absorb(candle),
            _ => out.push(Candle {
                timestamp: start,
                ..candle.clone()
            }),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn candle(h: u32, m: u32, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle {
            timestamp: ts(h, m),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn empty_input() {
        let tf: Timeframe = "5T".parse().unwrap();
        assert!(resample(&[], &tf).is_empty());
    }

    #[test]
    fn aggregates_ohlcv_per_window() {
        let tf: Timeframe = "5T".parse().unwrap();
        let rows = vec![
            candle(10, 0, 100.0, 101.0, 99.0, 100.5, 1.0),
            candle(10, 1, 100.5, 103.0, 100.0, 102.0, 2.0),
            candle(10, 4, 102.0, 102.5, 98.0, 99.0, 3.0),
            candle(10, 5, 99.0, 100.0, 97.0, 98.0, 4.0),
        ];
        let out = resample(&rows, &tf);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].timestamp, ts(10, 0));
        assert_eq!(out[0].open, 100.0);
        assert_eq!(out[0].high, 103.0);
        assert_eq!(out[0].low, 98.0);
        assert_eq!(out[0].close, 99.0);
        assert_eq!(out[0].volume, 6.0);

        assert_eq!(out[1].timestamp, ts(10, 5));
        assert_eq!(out[1].open, 99.0);
        assert_eq!(out[1].volume, 4.0);
    }

    #[test]
    fn labels_windows_by_start() {
        let tf: Timeframe = "30T".parse().unwrap();
        let rows = vec![candle(9, 47, 1.0, 1.0, 1.0, 1.0, 1.0)];
        let out = resample(&rows, &tf);
        assert_eq!(out[0].timestamp, ts(9, 30));
    }

    #[test]
    fn drops_empty_windows() {
        let tf: Timeframe = "5T".parse().unwrap();
        let rows = vec![
            candle(10, 0, 1.0, 1.0, 1.0, 1.0, 1.0),
            candle(10, 22, 2.0, 2.0, 2.0, 2.0, 1.0),
        ];
        let out = resample(&rows, &tf);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].timestamp, ts(10, 0));
        assert_eq!(out[1].timestamp, ts(10, 20));
    }

    #[test]
    fn duplicate_timestamps_share_a_window() {
        let tf: Timeframe = "1T".parse().unwrap();
        let rows = vec![
            candle(10, 0, 1.0, 2.0, 0.5, 1.5, 1.0),
            candle(10, 0, 1.5, 3.0, 1.0, 2.5, 1.0),
        ];
        let out = resample(&rows, &tf);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].high, 3.0);
        assert_eq!(out[0].close, 2.5);
        assert_eq!(out[0].volume, 2.0);
    }
}
