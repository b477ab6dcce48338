//! Parameter sweeps over lower-timeframe EMA periods and risk settings.
//!
//! Every case runs its own engine on rayon's pool. The higher-timeframe
//! series is prepared once and shared read-only across runs.

use rayon::prelude::*;
use tracing::info;

use crate::domain::backtest::{BacktestConfig, run_backtest};
use crate::domain::indicator::EmaPeriods;
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::Candle;
use crate::domain::strategy::Strategy;

#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    pub lower_ema_pairs: Vec<EmaPeriods>,
    pub risk_percents: Vec<f64>,
    pub risk_reward_ratios: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepCase {
    pub lower_emas: EmaPeriods,
    pub risk_percent: f64,
    pub risk_reward_ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepOutcome {
    pub case: SweepCase,
    pub final_capital: f64,
    pub total_trades: usize,
    /// Percent of trades with positive PnL.
    pub win_rate: f64,
    /// Percent.
    pub max_drawdown: f64,
}

impl ParamGrid {
    /// A one-case grid holding the base parameters.
    pub fn single(strategy: &Strategy, config: &BacktestConfig) -> Self {
        Self {
            lower_ema_pairs: vec![strategy.lower_emas],
            risk_percents: vec![config.risk_percent],
            risk_reward_ratios: vec![config.risk_reward_ratio],
        }
    }

    /// All cases in grid order, skipping pairs whose short period is not
    /// below the long period.
    pub fn cases(&self) -> Vec<SweepCase> {
        let mut cases = Vec::new();
        for &lower_emas in &self.lower_ema_pairs {
            if lower_emas.short >= lower_emas.long {
                continue;
            }
            for &risk_percent in &self.risk_percents {
                for &risk_reward_ratio in &self.risk_reward_ratios {
                    cases.push(SweepCase {
                        lower_emas,
                        risk_percent,
                        risk_reward_ratio,
                    });
                }
            }
        }
        cases
    }
}

/// Run every grid case against `candles`, in parallel. Outcomes are in
/// grid order.
pub fn run_sweep(
    candles: &[Candle],
    strategy: &Strategy,
    base: &BacktestConfig,
    grid: &ParamGrid,
) -> Vec<SweepOutcome> {
    let cases = grid.cases();
    info!(cases = cases.len(), "running parameter sweep");

    let higher = strategy.higher_series(candles);

    cases
        .par_iter()
        .map(|case| {
            let lower = strategy.with_lower_emas(case.lower_emas).lower_series(candles);
            let config = BacktestConfig {
                risk_percent: case.risk_percent,
                risk_reward_ratio: case.risk_reward_ratio,
                ..*base
            };
            let result = run_backtest(&lower, &higher, &config);
            let metrics = Metrics::compute(&result, config.initial_capital);

            SweepOutcome {
                case: *case,
                final_capital: metrics.final_capital,
                total_trades: metrics.total_trades,
                win_rate: metrics.win_rate,
                max_drawdown: metrics.max_drawdown,
            }
        })
        .collect()
}

/// Parse `9:21, 12:26` into EMA period pairs.
pub fn parse_ema_pairs(raw: &str) -> Result<Vec<EmaPeriods>, String> {
    split_list(raw)?
        .into_iter()
        .map(|item| {
            let (short, long) = item
                .split_once(':')
                .ok_or_else(|| format!("expected short:long, got {:?}", item))?;
            let parse = |s: &str| match s.trim().parse::<usize>() {
                Ok(0) | Err(_) => Err(format!("invalid EMA period {:?}", s.trim())),
                Ok(n) => Ok(n),
            };
            Ok(EmaPeriods::new(parse(short)?, parse(long)?))
        })
        .collect()
}

/// Parse a comma-separated list of numbers.
pub fn parse_number_list(raw: &str) -> Result<Vec<f64>, String> {
    split_list(raw)?
        .into_iter()
        .map(|item| match item.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(format!("{:?} is not a number", item)),
        })
        .collect()
}

fn split_list(raw: &str) -> Result<Vec<&str>, String> {
    if raw.trim().is_empty() {
        return Err("list is empty".to_string());
    }
    raw.split(',')
        .map(str::trim)
        .map(|item| {
            if item.is_empty() {
                Err("list has an empty entry".to_string())
            } else {
                Ok(item)
            }
        })
        .collect()
}
