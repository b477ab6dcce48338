//! Report generation port trait.

use std::path::Path;

use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::error::MtfcrossError;
use crate::domain::metrics::Metrics;
#[cfg(feature = "extended-stats")]
use crate::domain::stats::ReturnStats;
use crate::domain::strategy::Strategy;

/// Everything a report renders. Borrowed from the pipeline.
pub struct Report<'a> {
    pub strategy: &'a Strategy,
    pub config: &'a BacktestConfig,
    pub result: &'a BacktestResult,
    pub metrics: &'a Metrics,
    #[cfg(feature = "extended-stats")]
    pub stats: Option<&'a ReturnStats>,
    pub symbol: Option<&'a str>,
}

/// Port for writing backtest reports.
pub trait ReportPort {
    fn render(&self, report: &Report) -> String;

    fn write(&self, report: &Report, output_path: &Path) -> Result<(), MtfcrossError> {
        std::fs::write(output_path, self.render(report))?;
        Ok(())
    }
}
