//! Price history port.

use crate::domain::error::StockfolioError;
use crate::domain::price_series::PriceSeries;

pub trait PricePort {
    /// Full daily close history for `ticker`; `NoPriceData` if unknown.
    fn fetch_series(&self, ticker: &str) -> Result<PriceSeries, StockfolioError>;

    fn list_tickers(&self) -> Result<Vec<String>, StockfolioError>;
}
