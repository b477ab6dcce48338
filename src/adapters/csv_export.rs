//! CSV export of the trade ledger, equity curve and per-bar returns.

use std::io;
use std::path::Path;

use crate::domain::equity::{BarReturn, EquityPoint};
use crate::domain::error::MtfcrossError;
use crate::domain::position::Trade;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvExportAdapter;

impl CsvExportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_trades_to<W: io::Write>(&self, writer: W, trades: &[Trade]) -> Result<(), MtfcrossError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record([
            "entry_timestamp",
            "exit_timestamp",
            "type",
            "entry_price",
            "exit_price",
            "size",
            "pnl",
            "reason",
        ])?;
        for t in trades {
            wtr.write_record([
                t.entry_timestamp.format(TIMESTAMP_FORMAT).to_string(),
                t.exit_timestamp.format(TIMESTAMP_FORMAT).to_string(),
                t.direction.to_string(),
                t.entry_price.to_string(),
                t.exit_price.to_string(),
                t.size.to_string(),
                t.pnl.to_string(),
                t.exit_reason.to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_equity_to<W: io::Write>(
        &self,
        writer: W,
        equity_curve: &[EquityPoint],
    ) -> Result<(), MtfcrossError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["timestamp", "portfolio_value", "position_size"])?;
        for p in equity_curve {
            wtr.write_record([
                p.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                p.portfolio_value.to_string(),
                p.position_size.to_string(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_returns_to<W: io::Write>(&self, writer: W, returns: &[BarReturn]) -> Result<(), MtfcrossError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["timestamp", "returns"])?;
        for r in returns {
            wtr.write_record([r.timestamp.format(TIMESTAMP_FORMAT).to_string(), r.value.to_string()])?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_trades(&self, path: &Path, trades: &[Trade]) -> Result<(), MtfcrossError> {
        self.write_trades_to(std::fs::File::create(path)?, trades)
    }

    pub fn write_equity(&self, path: &Path, equity_curve: &[EquityPoint]) -> Result<(), MtfcrossError> {
        self.write_equity_to(std::fs::File::create(path)?, equity_curve)
    }

    pub fn write_returns(&self, path: &Path, returns: &[BarReturn]) -> Result<(), MtfcrossError> {
        self.write_returns_to(std::fs::File::create(path)?, returns)
    }
}

impl Default for CsvExportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::{Direction, ExitReason};
    use chrono::{NaiveDate, NaiveDateTime};
    use tempfile::TempDir;

    fn ts(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .unwrap()
            .and_hms_opt(h, 30, 0)
            .unwrap()
    }

    #[test]
    fn trades_csv_has_header_and_rows() {
        let trades = vec![Trade {
            direction: Direction::Short,
            entry_price: 101.5,
            exit_price: 99.0,
            pnl: 0.25,
            entry_timestamp: ts(9),
            exit_timestamp: ts(11),
            exit_reason: ExitReason::TakeProfit,
            size: 0.1,
        }];
        let mut buf = Vec::new();
        CsvExportAdapter::new().write_trades_to(&mut buf, &trades).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "entry_timestamp,exit_timestamp,type,entry_price,exit_price,size,pnl,reason"
        );
        assert_eq!(
            lines[1],
            "2024-06-03 09:30:00,2024-06-03 11:30:00,Short,101.5,99,0.1,0.25,Take Profit"
        );
    }

    #[test]
    fn equity_csv_round_trips_through_reader() {
        let curve = vec![
            EquityPoint { timestamp: ts(9), portfolio_value: 500.0, position_size: 0.0 },
            EquityPoint { timestamp: ts(10), portfolio_value: 499.5, position_size: 0.1 },
        ];
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("equity.csv");
        CsvExportAdapter::new().write_equity(&path, &curve).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[1][1], "499.5");
        assert_eq!(&rows[1][2], "0.1");
    }

    #[test]
    fn returns_csv() {
        let returns = vec![
            BarReturn { timestamp: ts(9), value: 0.0 },
            BarReturn { timestamp: ts(10), value: -0.002 },
        ];
        let mut buf = Vec::new();
        CsvExportAdapter::new().write_returns_to(&mut buf, &returns).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "timestamp,returns\n2024-06-03 09:30:00,0\n2024-06-03 10:30:00,-0.002\n");
    }

    #[test]
    fn write_to_missing_directory_is_io_error() {
        let err = CsvExportAdapter::new()
            .write_trades(Path::new("/nonexistent/dir/trades.csv"), &[])
            .unwrap_err();
        assert!(matches!(err, MtfcrossError::Io(_)));
    }
}
