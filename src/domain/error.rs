//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for stockfolio.
#[derive(Debug, thiserror::Error)]
pub enum StockfolioError {
    #[error("invalid ticker '{ticker}'")]
    InvalidTicker { ticker: String },

    #[error("invalid date '{date}': {reason}")]
    InvalidDate { date: String, reason: String },

    #[error("invalid share quantity {shares}: must be a positive number")]
    InvalidShares { shares: f64 },

    #[error("insufficient shares of {ticker} on {date}: requested {requested}, available {available}")]
    InsufficientShares {
        ticker: String,
        date: NaiveDate,
        requested: f64,
        available: f64,
    },

    #[error("transaction for {ticker} on {date} precedes the latest transaction on {latest}")]
    NonMonotonicTransaction {
        ticker: String,
        date: NaiveDate,
        latest: NaiveDate,
    },

    #[error("weights must sum to 100, got {total}")]
    WeightSum { total: i64 },

    #[error("invalid weights: {reason}")]
    InvalidWeights { reason: String },

    #[error("portfolio '{name}' not found")]
    PortfolioNotFound { name: String },

    #[error("no price data for {ticker}: {reason}")]
    NoPriceData { ticker: String, reason: String },

    #[error("insufficient price history for {ticker} on {date}: have {have} samples, need {need}")]
    InsufficientHistory {
        ticker: String,
        date: NaiveDate,
        have: usize,
        need: usize,
    },

    #[error("invalid moving average window {window}")]
    InvalidWindow { window: usize },

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

    #[error("storage error: {reason}")]
    Storage { reason: String },

    #[error("storage query error: {reason}")]
    StorageQuery { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StockfolioError {
    pub(crate) fn no_price_data(ticker: &str, reason: impl Into<String>) -> Self {
        StockfolioError::NoPriceData {
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit status: 1 io, 2 config, 3 storage, 4 ledger rule, 5 price data.
    pub fn exit_status(&self) -> u8 {
        match self {
            StockfolioError::Io(_) => 1,
            StockfolioError::ConfigParse { .. }
            | StockfolioError::ConfigMissing { .. }
            | StockfolioError::ConfigInvalid { .. } => 2,
            StockfolioError::Storage { .. } | StockfolioError::StorageQuery { .. } => 3,
            StockfolioError::InvalidTicker { .. }
            | StockfolioError::InvalidDate { .. }
            | StockfolioError::InvalidShares { .. }
            | StockfolioError::InsufficientShares { .. }
            | StockfolioError::NonMonotonicTransaction { .. }
            | StockfolioError::WeightSum { .. }
            | StockfolioError::InvalidWeights { .. }
            | StockfolioError::PortfolioNotFound { .. }
            | StockfolioError::InvalidWindow { .. } => 4,
            StockfolioError::NoPriceData { .. } | StockfolioError::InsufficientHistory { .. } => 5,
        }
    }
}

impl From<&StockfolioError> for std::process::ExitCode {
    fn from(err: &StockfolioError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
