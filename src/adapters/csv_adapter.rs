//! CSV file data adapter.
//!
//! Reads a header-keyed OHLCV file. Required columns are `timestamp`,
//! `open`, `high`, `low`, `close` and `volume`, matched case-insensitively.
//! Timestamps are day-first (`31/01/2024 13:45`) or ISO (`2024-01-31 13:45:00`).

use crate::domain::error::MtfcrossError;
use crate::domain::ohlcv::Candle;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const REQUIRED_COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

const DATETIME_FORMATS: [&str; 10] = [
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d"];

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse a day-first or ISO timestamp. Date-only values are midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_price(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
}

impl DataPort for CsvAdapter {
    fn fetch_candles(&self) -> Result<Vec<Candle>, MtfcrossError> {
        let content = fs::read_to_string(&self.path).map_err(|e| MtfcrossError::DataLoad {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();
        let column = |name: &str| headers.iter().position(|h| h == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| column(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(MtfcrossError::MissingColumns { columns: missing });
        }
        let idx: Vec<usize> = REQUIRED_COLUMNS.iter().filter_map(|name| column(name)).collect();

        let mut candles = Vec::new();
        let mut dropped = 0usize;

        for (i, result) in rdr.records().enumerate() {
            let record = result?;
            let row = i + 1;

            let raw_ts = record.get(idx[0]).unwrap_or("");
            let timestamp = parse_timestamp(raw_ts).ok_or_else(|| MtfcrossError::InvalidTimestamp {
                row,
                value: raw_ts.to_string(),
            })?;

            let values: Option<Vec<f64>> = idx[1..]
                .iter()
                .map(|&col| parse_price(record.get(col)))
                .collect();
            let Some(values) = values else {
                warn!(row, %timestamp, "dropping row with missing or non-numeric values");
                dropped += 1;
                continue;
            };

            let candle = Candle {
                timestamp,
                open: values[0],
                high: values[1],
                low: values[2],
                close: values[3],
                volume: values[4],
            };
            if !candle.is_finite() {
                warn!(row, %timestamp, "dropping row with non-finite values");
                dropped += 1;
                continue;
            }
            candles.push(candle);
        }

        candles.sort_by_key(|c| c.timestamp);
        info!(
            path = %self.path.display(),
            candles = candles.len(),
            dropped,
            "loaded candles"
        );
        Ok(candles)
    }
}
