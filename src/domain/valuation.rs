//! Portfolio valuation and value distribution as of a date.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use crate::domain::error::StockfolioError;
use crate::domain::portfolio::Portfolio;
use crate::domain::price_series::PriceSeries;
use crate::ports::price_port::PricePort;

/// Price series keyed by ticker, fetched once per operation.
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    series: HashMap<String, PriceSeries>,
}

impl PriceBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch every ticker through `port`. The first failed fetch fails the load.
    pub fn load(port: &dyn PricePort, tickers: &[&str]) -> Result<Self, StockfolioError> {
        let mut book = PriceBook::new();
        for ticker in tickers {
            if !book.series.contains_key(*ticker) {
                book.insert(port.fetch_series(ticker)?);
            }
        }
        Ok(book)
    }

    pub fn insert(&mut self, series: PriceSeries) {
        self.series.insert(series.ticker.clone(), series);
    }

    pub fn series(&self, ticker: &str) -> Result<&PriceSeries, StockfolioError> {
        self.series
            .get(ticker)
            .ok_or_else(|| StockfolioError::no_price_data(ticker, "series not loaded"))
    }

    pub fn price_on(&self, ticker: &str, date: NaiveDate) -> Result<f64, StockfolioError> {
        self.series(ticker)?.price_on(date)
    }
}

/// Σ over tickers of shares held as of `date` × close on (or before) `date`.
///
/// Tickers with nothing held on `date` need no price.
pub fn value(portfolio: &Portfolio, prices: &PriceBook, date: NaiveDate) -> Result<f64, StockfolioError> {
    let mut total = 0.0;
    for ticker in portfolio.tickers() {
        let shares = portfolio.valid_shares(ticker, date);
        if shares == 0.0 {
            continue;
        }
        total += shares * prices.price_on(ticker, date)?;
    }
    Ok(total)
}

/// Ticker → market value for tickers with a lot acquired on or before `date`.
pub fn distribution(
    portfolio: &Portfolio,
    prices: &PriceBook,
    date: NaiveDate,
) -> Result<BTreeMap<String, f64>, StockfolioError> {
    let mut distribution = BTreeMap::new();
    for ticker in portfolio.held_tickers(date) {
        let shares = portfolio.valid_shares(ticker, date);
        let market_value = if shares == 0.0 {
            0.0
        } else {
            shares * prices.price_on(ticker, date)?
        };
        distribution.insert(ticker.to_string(), market_value);
    }
    Ok(distribution)
}

/// Close on `date` for each held ticker, in lot-enumeration order.
pub fn closing_prices(
    portfolio: &Portfolio,
    prices: &PriceBook,
    date: NaiveDate,
) -> Result<Vec<(String, f64)>, StockfolioError> {
    portfolio
        .held_tickers(date)
        .into_iter()
        .map(|ticker| Ok((ticker.to_string(), prices.price_on(ticker, date)?)))
        .collect()
}
