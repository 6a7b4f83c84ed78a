//! Configuration validation.
//!
//! Validates the `[prices]`, `[store]` and `[sqlite]` sections before any
//! adapter is opened.

use crate::domain::error::StockfolioError;
use crate::ports::config_port::ConfigPort;

/// Storage kinds accepted by `[prices] source` and `[store] backend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Csv,
    Sqlite,
}

pub fn validate_app_config(config: &dyn ConfigPort) -> Result<(), StockfolioError> {
    let prices = backend_kind(config, "prices", "source")?;
    if prices == BackendKind::Csv {
        validate_non_empty_path(config, "prices", "dir")?;
    }
    let store = backend_kind(config, "store", "backend")?;
    if store == BackendKind::Csv {
        validate_non_empty_path(config, "store", "journal")?;
    }
    if prices == BackendKind::Sqlite || store == BackendKind::Sqlite {
        validate_sqlite(config)?;
    }
    Ok(())
}

/// Read a backend selector; a missing key selects CSV.
pub fn backend_kind(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<BackendKind, StockfolioError> {
    match config.get_string(section, key) {
        None => Ok(BackendKind::Csv),
        Some(value) => match value.trim().to_lowercase().as_str() {
            "csv" => Ok(BackendKind::Csv),
            "sqlite" => Ok(BackendKind::Sqlite),
            other => Err(StockfolioError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("unknown backend '{other}', expected csv or sqlite"),
            }),
        },
    }
}

fn validate_non_empty_path(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), StockfolioError> {
    match config.get_string(section, key) {
        Some(s) if s.trim().is_empty() => Err(StockfolioError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{key} must not be empty"),
        }),
        _ => Ok(()),
    }
}

fn validate_sqlite(config: &dyn ConfigPort) -> Result<(), StockfolioError> {
    if !cfg!(feature = "sqlite") {
        return Err(StockfolioError::ConfigInvalid {
            section: "sqlite".to_string(),
            key: "path".to_string(),
            reason: "stockfolio was built without the sqlite feature".to_string(),
        });
    }
    match config.get_string("sqlite", "path") {
        Some(s) if !s.trim().is_empty() => {}
        _ => {
            return Err(StockfolioError::ConfigMissing {
                section: "sqlite".to_string(),
                key: "path".to_string(),
            });
        }
    }
    let pool_size = config.get_int("sqlite", "pool_size", 4);
    if pool_size < 1 {
        return Err(StockfolioError::ConfigInvalid {
            section: "sqlite".to_string(),
            key: "pool_size".to_string(),
            reason: "pool_size must be at least 1".to_string(),
        });
    }
    Ok(())
}
