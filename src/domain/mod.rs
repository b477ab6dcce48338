//! Core domain types and logic.

pub mod ohlcv;
pub mod timeframe;
pub mod resample;
pub mod indicator;
pub mod trend;
pub mod position;
pub mod equity;
pub mod rules;
pub mod backtest;
pub mod metrics;
#[cfg(feature = "extended-stats")]
pub mod stats;
pub mod strategy;
pub mod config_validation;
pub mod sweep;
pub mod error;
