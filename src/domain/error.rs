//! Domain error types.

/// Top-level error type for mtfcross.
///
/// Only structural problems live here. Per-bar value problems are
/// [`SkipReason`](crate::domain::backtest::SkipReason)s and an empty trade
/// ledger is a normal result, not an error.
#[derive(Debug, thiserror::Error)]
pub enum MtfcrossError {
    #[error("failed to load data from {path}: {reason}")]
    DataLoad { path: String, reason: String },

    #[error("CSV is missing required columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("invalid timestamp {value:?} on row {row}")]
    InvalidTimestamp { row: usize, value: String },

    #[error("invalid timeframe {value:?}: {reason}")]
    InvalidTimeframe { value: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&MtfcrossError> for std::process::ExitCode {
    fn from(err: &MtfcrossError) -> Self {
        let code: u8 = match err {
            MtfcrossError::Io(_) => 1,
            MtfcrossError::ConfigParse { .. }
            | MtfcrossError::ConfigMissing { .. }
            | MtfcrossError::ConfigInvalid { .. }
            | MtfcrossError::InvalidTimeframe { .. } => 2,
            MtfcrossError::DataLoad { .. }
            | MtfcrossError::MissingColumns { .. }
            | MtfcrossError::InvalidTimestamp { .. }
            | MtfcrossError::Csv(_) => 3,
        };
        std::process::ExitCode::from(code)
    }
}
