//! Plain-text report adapter implementing ReportPort.

use chrono::Duration;

use crate::domain::metrics::Metrics;
use crate::ports::report_port::{Report, ReportPort};

pub struct TextReportAdapter;

impl TextReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn format_gap(gap: Duration) -> String {
    let secs = gap.num_seconds();
    let days = secs / 86_400;
    let rem = secs % 86_400;
    format!(
        "{} days {:02}:{:02}:{:02}",
        days,
        rem / 3_600,
        (rem % 3_600) / 60,
        rem % 60
    )
}

fn parameter_lines(report: &Report, lines: &mut Vec<String>) {
    let s = report.strategy;
    let c = report.config;
    lines.push(String::new());
    lines.push("Strategy Parameters:".to_string());
    lines.push(format!("Strategy: {}", s.name));
    lines.push(format!("Lower Timeframe: {}, EMAs: {}", s.lower_timeframe, s.lower_emas));
    lines.push(format!("Higher Timeframe: {}, EMAs: {}", s.higher_timeframe, s.higher_emas));
    lines.push(format!(
        "Risk: {}%, Risk-Reward Ratio: {}",
        c.risk_percent, c.risk_reward_ratio
    ));
    lines.push(format!(
        "Initial Capital: ${}, Lot Size: {}",
        c.initial_capital, c.lot_size
    ));
}

fn performance_lines(m: &Metrics, lines: &mut Vec<String>) {
    lines.push(String::new());
    lines.push("----- Performance Metrics -----".to_string());
    lines.push(format!("Total Trades: {}", m.total_trades));
    lines.push(format!("Win Rate: {:.2}%", m.win_rate));
    lines.push(format!("Total Profit: ${:.2}", m.total_profit));
    lines.push(format!("Final Capital: ${:.2}", m.final_capital));
    lines.push(format!("Total Return: {:.2}%", m.total_return_pct));
    if m.calendar_days > 0 {
        lines.push(format!("Annualized Return: {:.2}%", m.annualized_return));
        lines.push(format!(
            "Total Days in Market: {} out of {} ({:.2}%)",
            m.days_in_market, m.calendar_days, m.days_in_market_pct
        ));
    }
    lines.push(format!("Time in Market: {:.2}%", m.time_in_market_pct));
    lines.push(format!("Avg Profit per Trade: ${:.2}", m.avg_profit));
    lines.push(format!("Profit Factor: {:.2}", m.profit_factor));
    lines.push(format!("Max Drawdown: {:.2}%", m.max_drawdown));
    if let Some(gap) = m.avg_trade_gap {
        lines.push(format!("Avg Time Between Trades: {}", format_gap(gap)));
    }
}

fn trade_analysis_lines(m: &Metrics, lines: &mut Vec<String>) {
    lines.push(String::new());
    lines.push("----- Trade Analysis -----".to_string());
    lines.push(format!("Number of Long Signals Traded: {}", m.num_long_trades));
    lines.push(format!("Number of Short Signals Traded: {}", m.num_short_trades));
    lines.push(format!(
        "Total Number of Signals Generated: {} ({} long, {} short)",
        m.total_signals, m.long_signals, m.short_signals
    ));
    lines.push(format!("Number of Profitable Trades: {}", m.profitable_trades));
    lines.push(format!("Number of Loss Making Trades: {}", m.losing_trades));
    lines.push(format!("Profit from Profitable Trades: ${:.2}", m.profit_from_winners));
    lines.push(format!("Loss from Loss Making Trades: ${:.2}", m.loss_from_losers));
    lines.push(format!("Returns from Winning Trades: {:.2}%", m.returns_from_winners));
    lines.push(format!("Returns from Losing Trades: {:.2}%", m.returns_from_losers));
    lines.push(format!("Avg Win: ${:.2}", m.avg_win));
    lines.push(format!("Avg Loss: ${:.2}", m.avg_loss));
    if m.avg_loss != 0.0 {
        lines.push(format!("Avg Win/Loss Ratio: {:.2}", m.win_loss_ratio));
    }
    lines.push(format!("Longest Win Streak: {}", m.max_win_streak));
    lines.push(format!("Longest Loss Streak: {}", m.max_loss_streak));

    if !m.exit_reasons.is_empty() {
        lines.push(String::new());
        lines.push("----- Exit Reasons -----".to_string());
        for (reason, count) in &m.exit_reasons {
            lines.push(format!(
                "{}: {} trades ({:.1}%)",
                reason,
                count,
                *count as f64 / m.total_trades as f64 * 100.0
            ));
        }
    }
}

#[cfg(feature = "extended-stats")]
fn stats_lines(report: &Report, lines: &mut Vec<String>) {
    let Some(s) = report.stats else {
        return;
    };
    lines.push(String::new());
    lines.push("----- Return Statistics -----".to_string());
    let rows: [(&str, f64, &str); 16] = [
        ("CAGR", s.cagr * 100.0, "%"),
        ("Volatility", s.volatility * 100.0, "%"),
        ("Sharpe Ratio", s.sharpe, ""),
        ("Sortino Ratio", s.sortino, ""),
        ("Calmar Ratio", s.calmar, ""),
        ("Max Drawdown", s.max_drawdown * 100.0, "%"),
        ("Win Rate", s.win_rate * 100.0, "%"),
        ("Avg Win", s.avg_win * 100.0, "%"),
        ("Avg Loss", s.avg_loss * 100.0, "%"),
        ("Best Period", s.best * 100.0, "%"),
        ("Worst Period", s.worst * 100.0, "%"),
        ("Risk of Ruin", s.risk_of_ruin, ""),
        ("Value at Risk (95%)", s.value_at_risk * 100.0, "%"),
        ("Expected Shortfall (95%)", s.expected_shortfall * 100.0, "%"),
        ("Tail Ratio", s.tail_ratio, ""),
        ("Common Sense Ratio", s.common_sense_ratio, ""),
    ];
    for (label, value, suffix) in rows {
        if label == "Risk of Ruin" {
            lines.push(format!("{}: {:.6}", label, value));
        } else {
            lines.push(format!("{}: {:.2}{}", label, value, suffix));
        }
    }
}

impl ReportPort for TextReportAdapter {
    fn render(&self, report: &Report) -> String {
        let result = report.result;
        let mut lines = vec!["===== MULTI-TIMEFRAME STRATEGY PERFORMANCE REPORT =====".to_string()];

        if let Some(symbol) = report.symbol.filter(|s| !s.is_empty()) {
            lines.push(format!("Symbol: {}", symbol));
        }
        if let (Some(first), Some(last)) = (result.equity_curve.first(), result.equity_curve.last()) {
            lines.push(format!("Period: {} to {}", first.timestamp, last.timestamp));
        }

        parameter_lines(report, &mut lines);

        if result.has_trades() {
            performance_lines(report.metrics, &mut lines);
            trade_analysis_lines(report.metrics, &mut lines);
        } else {
            lines.push(String::new());
            lines.push("No trades executed.".to_string());
        }

        if let Some(open) = &result.open_position {
            lines.push(String::new());
            lines.push(format!(
                "Open Position: {} from {} at {:.5} (SL {:.5}, TP {:.5})",
                open.direction, open.entry_timestamp, open.entry_price, open.stop_loss, open.take_profit
            ));
        }
        if !result.skipped.is_empty() {
            lines.push(format!("Skipped Bars: {}", result.skipped.len()));
        }

        #[cfg(feature = "extended-stats")]
        stats_lines(report, &mut lines);

        lines.push(String::new());
        lines.join("\n")
    }
}
