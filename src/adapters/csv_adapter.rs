//! CSV price file adapter.
//!
//! One file per ticker, `<dir>/<TICKER>.csv`, with a header row. The default
//! layout is the daily export `timestamp,open,high,low,close,volume`; a column
//! headed `close` is used wherever it sits. Rows may be in any order.

use crate::domain::calendar::DATE_FORMAT;
use crate::domain::error::StockfolioError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::ports::price_port::PricePort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CLOSE_COLUMN: usize = 4;

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }
}

fn malformed(path: &std::path::Path, line: u64, reason: impl std::fmt::Display) -> StockfolioError {
    StockfolioError::Storage {
        reason: format!("{} line {}: {}", path.display(), line, reason),
    }
}

impl PricePort for CsvPriceAdapter {
    fn fetch_series(&self, ticker: &str) -> Result<PriceSeries, StockfolioError> {
        let path = self.csv_path(ticker);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StockfolioError::no_price_data(
                    ticker,
                    format!("{} does not exist", path.display()),
                ));
            }
            Err(e) => return Err(StockfolioError::Io(e)),
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let close_column = rdr
            .headers()
            .map_err(|e| malformed(&path, 1, e))?
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("close"))
            .unwrap_or(DEFAULT_CLOSE_COLUMN);

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| StockfolioError::Storage {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let date_str = record
                .get(0)
                .ok_or_else(|| malformed(&path, line, "missing date column"))?;
            let date = NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT)
                .map_err(|e| malformed(&path, line, format!("invalid date '{date_str}': {e}")))?;

            let close: f64 = record
                .get(close_column)
                .ok_or_else(|| malformed(&path, line, "missing close column"))?
                .trim()
                .parse()
                .map_err(|e| malformed(&path, line, format!("invalid close value: {e}")))?;

            points.push(PricePoint::new(date, close));
        }

        if points.is_empty() {
            return Err(StockfolioError::no_price_data(
                ticker,
                format!("{} has no rows", path.display()),
            ));
        }
        debug!(ticker, rows = points.len(), path = %path.display(), "loaded price file");
        Ok(PriceSeries::new(ticker, points))
    }

    fn list_tickers(&self) -> Result<Vec<String>, StockfolioError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| StockfolioError::Storage {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StockfolioError::Storage {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(ticker) = name_str.strip_suffix(".csv") {
                if !ticker.is_empty() {
                    tickers.push(ticker.to_string());
                }
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}
