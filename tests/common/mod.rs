#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use mtfcross::domain::error::MtfcrossError;
pub use mtfcross::domain::ohlcv::Candle;
use mtfcross::ports::data_port::DataPort;
use std::io::Write;

pub struct MockDataPort {
    pub candles: Vec<Candle>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self {
            candles,
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            candles: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_candles(&self) -> Result<Vec<Candle>, MtfcrossError> {
        if let Some(reason) = &self.error {
            return Err(MtfcrossError::DataLoad {
                path: "mock".to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.candles.clone())
    }
}

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Candle `i` five-minute steps after midnight, with a 0.05 wick each side.
pub fn make_candle(i: i64, close: f64) -> Candle {
    Candle {
        timestamp: start() + Duration::minutes(5 * i),
        open: close,
        high: close + 0.05,
        low: close - 0.05,
        close,
        volume: 10.0,
    }
}

pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_candle(i as i64, c))
        .collect()
}

/// Five-minute closes: 200 bars rising 0.1, a 6-bar dip of 0.5 per bar,
/// then a recovery of 0.5 per bar. With the default strategy this yields
/// one long entry inside a bullish higher trend that exits at take-profit.
pub fn dip_and_recovery_closes() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..200).map(|i| 100.0 + 0.1 * i as f64).collect();
    let mut last = closes[199];
    for _ in 0..6 {
        last -= 0.5;
        closes.push(last);
    }
    for _ in 0..55 {
        last += 0.5;
        closes.push(last);
    }
    closes
}

/// Deterministic pseudo-random walk, no external RNG.
pub fn zigzag_closes(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    let mut price = 100.0;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let step = ((state >> 33) % 200) as f64 / 100.0 - 1.0;
            price = (price + step).max(1.0);
            price
        })
        .collect()
}

pub fn csv_text(candles: &[Candle]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for c in candles {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            c.timestamp.format("%d/%m/%Y %H:%M"),
            c.open,
            c.high,
            c.low,
            c.close,
            c.volume
        ));
    }
    out
}

pub fn write_temp_csv(candles: &[Candle]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(csv_text(candles).as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
