//! Extended return statistics over the equity curve.
//!
//! Period returns are the percentage change of portfolio value between
//! consecutive equity points, with the first period fixed at 0. Ratios are
//! annualized with 252 periods per year and a zero risk-free rate. All
//! values are fractions; the report renders percentages.

use thiserror::Error;

use super::equity::EquityPoint;

const PERIODS_PER_YEAR: f64 = 252.0;
/// Standard normal quantile at 5%.
const Z_05: f64 = -1.6448536269514722;

#[derive(Debug, Error, PartialEq)]
pub enum StatsError {
    #[error("need at least 2 equity points, got {0}")]
    InsufficientData(usize),

    #[error("returns have zero variance")]
    ZeroVariance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStats {
    pub cagr: f64,
    pub volatility: f64,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    /// Negative fraction, e.g. -0.05 for a 5% drawdown.
    pub max_drawdown: f64,
    /// Share of non-zero periods that were positive.
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub best: f64,
    pub worst: f64,
    pub risk_of_ruin: f64,
    pub value_at_risk: f64,
    pub expected_shortfall: f64,
    pub tail_ratio: f64,
    pub common_sense_ratio: f64,
}

impl ReturnStats {
    pub fn compute(equity_curve: &[EquityPoint]) -> Result<Self, StatsError> {
        if equity_curve.len() < 2 {
            return Err(StatsError::InsufficientData(equity_curve.len()));
        }
        let returns = period_returns(equity_curve);
        let n = returns.len() as f64;

        let mu = mean(&returns);
        let sigma = std_dev(&returns, mu);
        if sigma == 0.0 || !sigma.is_finite() {
            return Err(StatsError::ZeroVariance);
        }

        let cagr = cagr(&returns, equity_curve);
        let max_drawdown = max_drawdown(&returns);

        let downside = (returns.iter().filter(|&&r| r < 0.0).map(|r| r * r).sum::<f64>() / n).sqrt();
        let sortino = if downside > 0.0 {
            mu / downside * PERIODS_PER_YEAR.sqrt()
        } else {
            f64::INFINITY
        };

        let calmar = if max_drawdown != 0.0 {
            cagr / max_drawdown.abs()
        } else {
            f64::INFINITY
        };

        let wins: Vec<f64> = returns.iter().copied().filter(|&r| r > 0.0).collect();
        let losses: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
        let nonzero = wins.len() + losses.len();
        let win_rate = if nonzero > 0 {
            wins.len() as f64 / nonzero as f64
        } else {
            0.0
        };

        let value_at_risk = mu + sigma * Z_05;
        let tail: Vec<f64> = returns.iter().copied().filter(|&r| r < value_at_risk).collect();
        let expected_shortfall = if tail.is_empty() { value_at_risk } else { mean(&tail) };

        let tail_ratio = (quantile(&returns, 0.95) / quantile(&returns, 0.05)).abs();
        let gains: f64 = returns.iter().filter(|&&r| r >= 0.0).sum();
        let pains: f64 = losses.iter().sum();
        let profit_factor = (gains / pains).abs();

        Ok(ReturnStats {
            cagr,
            volatility: sigma * PERIODS_PER_YEAR.sqrt(),
            sharpe: mu / sigma * PERIODS_PER_YEAR.sqrt(),
            sortino,
            calmar,
            max_drawdown,
            win_rate,
            avg_win: if wins.is_empty() { 0.0 } else { mean(&wins) },
            avg_loss: if losses.is_empty() { 0.0 } else { mean(&losses) },
            best: returns.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            worst: returns.iter().copied().fold(f64::INFINITY, f64::min),
            risk_of_ruin: ((1.0 - win_rate) / (1.0 + win_rate)).powf(n),
            value_at_risk,
            expected_shortfall,
            tail_ratio,
            common_sense_ratio: profit_factor * tail_ratio,
        })
    }
}

/// Percentage change of portfolio value, first period 0.
pub fn period_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(equity_curve.len());
    if !equity_curve.is_empty() {
        returns.push(0.0);
    }
    returns.extend(equity_curve.windows(2).map(|w| {
        let prev = w[0].portfolio_value;
        if prev != 0.0 {
            w[1].portfolio_value / prev - 1.0
        } else {
            0.0
        }
    }));
    returns
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1).
fn std_dev(values: &[f64], mean: f64) -> f64 {
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (values.len() as f64 - 1.0)).sqrt()
}

fn compounded(returns: &[f64]) -> impl Iterator<Item = f64> + '_ {
    returns.iter().scan(1.0, |acc, r| {
        *acc *= 1.0 + r;
        Some(*acc)
    })
}

fn cagr(returns: &[f64], equity_curve: &[EquityPoint]) -> f64 {
    let (Some(first), Some(last)) = (equity_curve.first(), equity_curve.last()) else {
        return 0.0;
    };
    let years = (last.timestamp - first.timestamp).num_days() as f64 / 365.0;
    if years <= 0.0 {
        return 0.0;
    }
    let growth = compounded(returns).last().unwrap_or(1.0);
    growth.abs().powf(1.0 / years) - 1.0
}

fn max_drawdown(returns: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    compounded(returns)
        .map(|price| {
            peak = peak.max(price);
            price / peak - 1.0
        })
        .fold(0.0, f64::min)
}

/// Quantile with linear interpolation between closest ranks.
fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
