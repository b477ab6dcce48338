//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_export::CsvExportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report::TextReportAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    validate_backtest_config, validate_strategy_config, validate_sweep_config,
};
use crate::domain::error::MtfcrossError;
use crate::domain::indicator::EmaPeriods;
use crate::domain::metrics::Metrics;
#[cfg(feature = "extended-stats")]
use crate::domain::stats::ReturnStats;
use crate::domain::strategy::{DEFAULT_NAME, Strategy};
use crate::domain::sweep::{self, ParamGrid, SweepOutcome};
use crate::domain::timeframe::Timeframe;
use crate::logging::{LogConfig, init_logging};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{Report, ReportPort};

#[derive(Parser, Debug)]
#[command(name = "mtfcross", about = "Multi-timeframe EMA crossover backtester")]
pub struct Cli {
    /// Log level used when RUST_LOG is not set (e.g. debug, info, warn)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and print the report
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Price CSV, overrides [data] csv_path
        #[arg(long)]
        data: Option<PathBuf>,
        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        trades_csv: Option<PathBuf>,
        #[arg(long)]
        equity_csv: Option<PathBuf>,
        #[arg(long)]
        returns_csv: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the data range of the price file
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Run a parameter sweep
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        data: Option<PathBuf>,
    },
}

/// Optional output destinations for a backtest run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputPaths {
    pub report: Option<PathBuf>,
    pub trades_csv: Option<PathBuf>,
    pub equity_csv: Option<PathBuf>,
    pub returns_csv: Option<PathBuf>,
}

impl OutputPaths {
    /// CLI flags win over `[report]` keys.
    pub fn resolve(
        config: &dyn ConfigPort,
        report: Option<PathBuf>,
        trades_csv: Option<PathBuf>,
        equity_csv: Option<PathBuf>,
        returns_csv: Option<PathBuf>,
    ) -> Self {
        let from_config = |key: &str| {
            config
                .get_string("report", key)
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
        };
        Self {
            report: report.or_else(|| from_config("output")),
            trades_csv: trades_csv.or_else(|| from_config("trades_csv")),
            equity_csv: equity_csv.or_else(|| from_config("equity_csv")),
            returns_csv: returns_csv.or_else(|| from_config("returns_csv")),
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let mut log_config = LogConfig::from_env();
    if let Some(level) = cli.log_level {
        log_config = log_config.with_default_level(level);
    }
    if let Err(e) = init_logging(log_config) {
        eprintln!("warning: logging disabled: {e}");
    }

    let outcome = match cli.command {
        Command::Backtest {
            config,
            data,
            output,
            trades_csv,
            equity_csv,
            returns_csv,
        } => run_backtest(&config, data, output, trades_csv, equity_csv, returns_csv),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, data } => run_info(&config, data),
        Command::Sweep { config, data } => run_sweep(&config, data),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, MtfcrossError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

fn parse_period(adapter: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, MtfcrossError> {
    match adapter.get_string("strategy", key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n),
            _ => Err(MtfcrossError::ConfigInvalid {
                section: "strategy".into(),
                key: key.into(),
                reason: format!("{:?} is not a positive whole number", raw),
            }),
        },
    }
}

fn parse_timeframe(
    adapter: &dyn ConfigPort,
    key: &str,
    default: Timeframe,
) -> Result<Timeframe, MtfcrossError> {
    match adapter.get_string("strategy", key) {
        Some(raw) => raw.parse(),
        None => Ok(default),
    }
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<Strategy, MtfcrossError> {
    let name = adapter
        .get_string("strategy", "name")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_NAME.to_string());

    Ok(Strategy {
        name,
        lower_timeframe: parse_timeframe(adapter, "lower_timeframe", Timeframe::default_lower())?,
        higher_timeframe: parse_timeframe(adapter, "higher_timeframe", Timeframe::default_higher())?,
        lower_emas: EmaPeriods::new(
            parse_period(adapter, "lower_ema_short", 9)?,
            parse_period(adapter, "lower_ema_long", 21)?,
        ),
        higher_emas: EmaPeriods::new(
            parse_period(adapter, "higher_ema_short", 9)?,
            parse_period(adapter, "higher_ema_long", 21)?,
        ),
    })
}

/// Read `[backtest]`, falling back to defaults. Call after
/// [`validate_backtest_config`].
pub fn build_backtest_config(adapter: &dyn ConfigPort) -> BacktestConfig {
    let defaults = BacktestConfig::default();
    BacktestConfig {
        initial_capital: adapter.get_double("backtest", "initial_capital", defaults.initial_capital),
        lot_size: adapter.get_double("backtest", "lot_size", defaults.lot_size),
        risk_percent: adapter.get_double("backtest", "risk_percent", defaults.risk_percent),
        risk_reward_ratio: adapter.get_double(
            "backtest",
            "risk_reward_ratio",
            defaults.risk_reward_ratio,
        ),
    }
}

/// Build the sweep grid; lists absent from `[sweep]` hold the base value.
pub fn build_param_grid(
    adapter: &dyn ConfigPort,
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<ParamGrid, MtfcrossError> {
    let invalid = |key: &str, reason: String| MtfcrossError::ConfigInvalid {
        section: "sweep".into(),
        key: key.into(),
        reason,
    };
    let mut grid = ParamGrid::single(strategy, config);
    if let Some(raw) = adapter.get_string("sweep", "lower_ema_pairs") {
        grid.lower_ema_pairs =
            sweep::parse_ema_pairs(&raw).map_err(|r| invalid("lower_ema_pairs", r))?;
    }
    if let Some(raw) = adapter.get_string("sweep", "risk_percents") {
        grid.risk_percents = sweep::parse_number_list(&raw).map_err(|r| invalid("risk_percents", r))?;
    }
    if let Some(raw) = adapter.get_string("sweep", "risk_reward_ratios") {
        grid.risk_reward_ratios =
            sweep::parse_number_list(&raw).map_err(|r| invalid("risk_reward_ratios", r))?;
    }
    Ok(grid)
}

pub fn resolve_data_path(
    data_override: Option<PathBuf>,
    adapter: &dyn ConfigPort,
) -> Result<PathBuf, MtfcrossError> {
    match data_override {
        Some(path) => Ok(path),
        None => adapter.require_string("data", "csv_path").map(PathBuf::from),
    }
}

fn run_backtest(
    config_path: &Path,
    data: Option<PathBuf>,
    output: Option<PathBuf>,
    trades_csv: Option<PathBuf>,
    equity_csv: Option<PathBuf>,
    returns_csv: Option<PathBuf>,
) -> Result<(), MtfcrossError> {
    // Stage 1: Load and validate config
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    validate_strategy_config(&adapter)?;

    // Stage 2: Build strategy and engine parameters
    let strategy = build_strategy(&adapter)?;
    let bt_config = build_backtest_config(&adapter);
    let outputs = OutputPaths::resolve(&adapter, output, trades_csv, equity_csv, returns_csv);
    let symbol = adapter.get_string("report", "symbol");
    let extended_stats = adapter.get_bool("report", "extended_stats", true);

    // Stage 3: Resolve data source
    let data_port = CsvAdapter::new(resolve_data_path(data, &adapter)?);

    run_backtest_pipeline(
        &data_port,
        &strategy,
        &bt_config,
        &outputs,
        symbol.as_deref(),
        extended_stats,
    )
    .map(|_| ())
}

/// Load, prepare, run, report and export. Returns the engine result.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategy: &Strategy,
    bt_config: &BacktestConfig,
    outputs: &OutputPaths,
    symbol: Option<&str>,
    extended_stats: bool,
) -> Result<BacktestResult, MtfcrossError> {
    info!(
        strategy = %strategy.name,
        lower = %strategy.lower_timeframe,
        lower_emas = %strategy.lower_emas,
        higher = %strategy.higher_timeframe,
        higher_emas = %strategy.higher_emas,
        "starting backtest"
    );

    // Stage 4: Load candles and build both timeframes
    let candles = data_port.fetch_candles()?;
    let prepared = strategy.prepare(&candles);

    // Stage 5: Run the engine
    let result = backtest_engine::run_backtest(&prepared.lower, &prepared.higher, bt_config);

    // Stage 6: Metrics and statistics
    let metrics = Metrics::compute(&result, bt_config.initial_capital);

    #[cfg(feature = "extended-stats")]
    let stats = if extended_stats && result.has_trades() {
        match ReturnStats::compute(&result.equity_curve) {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!(error = %e, "skipping return statistics");
                None
            }
        }
    } else {
        None
    };
    #[cfg(not(feature = "extended-stats"))]
    let _ = extended_stats;

    // Stage 7: Report
    let report = Report {
        strategy,
        config: bt_config,
        result: &result,
        metrics: &metrics,
        #[cfg(feature = "extended-stats")]
        stats: stats.as_ref(),
        symbol,
    };
    let reporter = TextReportAdapter::new();
    match &outputs.report {
        Some(path) => {
            reporter.write(&report, path)?;
            info!(path = %path.display(), "report written");
        }
        None => print!("{}", reporter.render(&report)),
    }

    // Stage 8: Exports
    let exporter = CsvExportAdapter::new();
    if let Some(path) = &outputs.trades_csv {
        exporter.write_trades(path, &result.trades)?;
        info!(path = %path.display(), trades = result.trades.len(), "trade ledger written");
    }
    if let Some(path) = &outputs.equity_csv {
        exporter.write_equity(path, &result.equity_curve)?;
        info!(path = %path.display(), "equity curve written");
    }
    if let Some(path) = &outputs.returns_csv {
        exporter.write_returns(path, &result.returns)?;
        info!(path = %path.display(), "returns written");
    }

    if !result.has_trades() {
        warn!("no trades were executed during the backtest period");
    }
    Ok(result)
}

fn run_validate(config_path: &Path) -> Result<(), MtfcrossError> {
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    validate_strategy_config(&adapter)?;
    validate_sweep_config(&adapter)?;
    adapter.require_string("data", "csv_path")?;

    let strategy = build_strategy(&adapter)?;
    let bt_config = build_backtest_config(&adapter);
    println!("Config OK");
    println!("Strategy: {}", strategy.name);
    println!(
        "Lower Timeframe: {}, EMAs: {}",
        strategy.lower_timeframe, strategy.lower_emas
    );
    println!(
        "Higher Timeframe: {}, EMAs: {}",
        strategy.higher_timeframe, strategy.higher_emas
    );
    println!(
        "Risk: {}%, Risk-Reward Ratio: {}, Initial Capital: ${}, Lot Size: {}",
        bt_config.risk_percent,
        bt_config.risk_reward_ratio,
        bt_config.initial_capital,
        bt_config.lot_size
    );
    Ok(())
}

fn run_info(config_path: &Path, data: Option<PathBuf>) -> Result<(), MtfcrossError> {
    let adapter = load_config(config_path)?;
    let data_port = CsvAdapter::new(resolve_data_path(data, &adapter)?);
    println!("{}", data_info(&data_port, data_port.path())?);
    Ok(())
}

/// One-line summary of a data source.
pub fn data_info(data_port: &dyn DataPort, source: &Path) -> Result<String, MtfcrossError> {
    Ok(match data_port.data_range()? {
        Some((first, last, rows)) => format!(
            "{}: {} candles from {} to {}",
            source.display(),
            rows,
            first,
            last
        ),
        None => format!("{}: no data", source.display()),
    })
}

fn run_sweep(config_path: &Path, data: Option<PathBuf>) -> Result<(), MtfcrossError> {
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    validate_strategy_config(&adapter)?;
    validate_sweep_config(&adapter)?;

    let strategy = build_strategy(&adapter)?;
    let bt_config = build_backtest_config(&adapter);
    let grid = build_param_grid(&adapter, &strategy, &bt_config)?;

    let data_port = CsvAdapter::new(resolve_data_path(data, &adapter)?);
    let candles = data_port.fetch_candles()?;
    let outcomes = sweep::run_sweep(&candles, &strategy, &bt_config, &grid);
    print!("{}", format_sweep_table(&outcomes));
    Ok(())
}

pub fn format_sweep_table(outcomes: &[SweepOutcome]) -> String {
    let mut out = format!(
        "{:<10} {:>7} {:>6} {:>14} {:>7} {:>9} {:>8}\n",
        "EMAs", "Risk%", "RR", "Final Capital", "Trades", "Win Rate", "Max DD"
    );
    for o in outcomes {
        out.push_str(&format!(
            "{:<10} {:>7.2} {:>6.2} {:>14.2} {:>7} {:>8.2}% {:>7.2}%\n",
            o.case.lower_emas.to_string(),
            o.case.risk_percent,
            o.case.risk_reward_ratio,
            o.final_capital,
            o.total_trades,
            o.win_rate,
            o.max_drawdown
        ));
    }
    out
}
