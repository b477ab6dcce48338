//! Configuration validation.
//!
//! Validates all config fields before a backtest or sweep runs. Absent keys
//! fall back to their defaults; present keys must parse and be in range.

use crate::domain::error::MtfcrossError;
use crate::domain::sweep::{parse_ema_pairs, parse_number_list};
use crate::domain::timeframe::Timeframe;
use crate::ports::config_port::ConfigPort;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), MtfcrossError> {
    validate_number(config, "backtest", "initial_capital", |v| v > 0.0, "must be positive")?;
    validate_number(config, "backtest", "lot_size", |v| v > 0.0, "must be positive")?;
    validate_number(config, "backtest", "risk_percent", |v| v >= 0.0, "must be non-negative")?;
    validate_number(
        config,
        "backtest",
        "risk_reward_ratio",
        |v| v >= 0.0,
        "must be non-negative",
    )?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), MtfcrossError> {
    for key in [
        "lower_ema_short",
        "lower_ema_long",
        "higher_ema_short",
        "higher_ema_long",
    ] {
        validate_period(config, key)?;
    }
    validate_timeframes(config)
}

pub fn validate_sweep_config(config: &dyn ConfigPort) -> Result<(), MtfcrossError> {
    if let Some(raw) = config.get_string("sweep", "lower_ema_pairs") {
        parse_ema_pairs(&raw).map_err(|reason| invalid("sweep", "lower_ema_pairs", reason))?;
    }
    for key in ["risk_percents", "risk_reward_ratios"] {
        if let Some(raw) = config.get_string("sweep", key) {
            let values = parse_number_list(&raw).map_err(|reason| invalid("sweep", key, reason))?;
            if values.iter().any(|&v| v < 0.0) {
                return Err(invalid("sweep", key, "values must be non-negative"));
            }
        }
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> MtfcrossError {
    MtfcrossError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    in_range: impl Fn(f64) -> bool,
    reason: &str,
) -> Result<(), MtfcrossError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(());
    };
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, format!("{:?} is not a number", raw)))?;
    if !value.is_finite() || !in_range(value) {
        return Err(invalid(section, key, format!("{} {}", key, reason)));
    }
    Ok(())
}

fn validate_period(config: &dyn ConfigPort, key: &str) -> Result<(), MtfcrossError> {
    let Some(raw) = config.get_string("strategy", key) else {
        return Ok(());
    };
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(invalid("strategy", key, format!("{} must be at least 1", key))),
        Ok(_) => Ok(()),
        Err(_) => Err(invalid(
            "strategy",
            key,
            format!("{:?} is not a whole number", raw),
        )),
    }
}

fn validate_timeframes(config: &dyn ConfigPort) -> Result<(), MtfcrossError> {
    let lower = match config.get_string("strategy", "lower_timeframe") {
        Some(raw) => raw.parse::<Timeframe>()?,
        None => Timeframe::default_lower(),
    };
    let higher = match config.get_string("strategy", "higher_timeframe") {
        Some(raw) => raw.parse::<Timeframe>()?,
        None => Timeframe::default_higher(),
    };
    if lower.seconds() >= higher.seconds() {
        return Err(invalid(
            "strategy",
            "lower_timeframe",
            format!(
                "lower timeframe {} must be shorter than higher timeframe {}",
                lower, higher
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn invalid_key(err: &MtfcrossError) -> Option<&str> {
        match err {
            MtfcrossError::ConfigInvalid { key, .. } => Some(key.as_str()),
            _ => None,
        }
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[backtest]
initial_capital = 500.0
lot_size = 0.1
risk_percent = 1
risk_reward_ratio = 2
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = make_config("[backtest]\n");
        assert!(validate_backtest_config(&config).is_ok());
        assert!(validate_strategy_config(&config).is_ok());
        assert!(validate_sweep_config(&config).is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        let config = make_config("[backtest]\ninitial_capital = 0\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert_eq!(invalid_key(&err), Some("initial_capital"));
    }

    #[test]
    fn lot_size_negative_fails() {
        let config = make_config("[backtest]\nlot_size = -0.1\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert_eq!(invalid_key(&err), Some("lot_size"));
    }

    #[test]
    fn risk_percent_zero_is_allowed() {
        let config = make_config("[backtest]\nrisk_percent = 0\nrisk_reward_ratio = 0\n");
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn risk_percent_negative_fails() {
        let config = make_config("[backtest]\nrisk_percent = -1\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert_eq!(invalid_key(&err), Some("risk_percent"));
    }

    #[test]
    fn risk_reward_negative_fails() {
        let config = make_config("[backtest]\nrisk_reward_ratio = -2\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert_eq!(invalid_key(&err), Some("risk_reward_ratio"));
    }

    #[test]
    fn non_numeric_value_fails() {
        let config = make_config("[backtest]\ninitial_capital = lots\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert_eq!(invalid_key(&err), Some("initial_capital"));
        assert!(err.to_string().contains("not a number"));
    }

    #[test]
    fn valid_strategy_config_passes() {
        let config = make_config(
            r#"
[strategy]
lower_timeframe = 15min
higher_timeframe = 4h
lower_ema_short = 12
lower_ema_long = 26
higher_ema_short = 9
higher_ema_long = 21
"#,
        );
        assert!(validate_strategy_config(&config).is_ok());
    }

    #[test]
    fn zero_ema_period_fails() {
        let config = make_config("[strategy]\nhigher_ema_long = 0\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert_eq!(invalid_key(&err), Some("higher_ema_long"));
    }

    #[test]
    fn fractional_ema_period_fails() {
        let config = make_config("[strategy]\nlower_ema_short = 9.5\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert_eq!(invalid_key(&err), Some("lower_ema_short"));
    }

    #[test]
    fn bad_timeframe_fails() {
        let config = make_config("[strategy]\nlower_timeframe = 5W\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, MtfcrossError::InvalidTimeframe { .. }));
    }

    #[test]
    fn overflowing_timeframe_fails() {
        let config = make_config("[strategy]\nhigher_timeframe = 200000000000000D\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, MtfcrossError::InvalidTimeframe { .. }));
    }

    #[test]
    fn lower_timeframe_must_be_shorter() {
        let config = make_config("[strategy]\nlower_timeframe = 1h\nhigher_timeframe = 60min\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert_eq!(invalid_key(&err), Some("lower_timeframe"));
    }

    #[test]
    fn valid_sweep_config_passes() {
        let config = make_config(
            "[sweep]\nlower_ema_pairs = 9:21, 12:26\nrisk_percents = 0.5,1\nrisk_reward_ratios = 1.5, 2, 3\n",
        );
        assert!(validate_sweep_config(&config).is_ok());
    }

    #[test]
    fn malformed_ema_pairs_fail() {
        let config = make_config("[sweep]\nlower_ema_pairs = 9-21\n");
        let err = validate_sweep_config(&config).unwrap_err();
        assert_eq!(invalid_key(&err), Some("lower_ema_pairs"));
    }

    #[test]
    fn negative_sweep_values_fail() {
        let config = make_config("[sweep]\nrisk_reward_ratios = 2,-1\n");
        let err = validate_sweep_config(&config).unwrap_err();
        assert_eq!(invalid_key(&err), Some("risk_reward_ratios"));
    }

    #[test]
    fn malformed_number_list_fails() {
        let config = make_config("[sweep]\nrisk_percents = 1,,2\n");
        let err = validate_sweep_config(&config).unwrap_err();
        assert_eq!(invalid_key(&err), Some("risk_percents"));
    }
}
