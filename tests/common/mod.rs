#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;
use stockfolio::domain::error::StockfolioError;
pub use stockfolio::domain::price_series::{PricePoint, PriceSeries};
use stockfolio::domain::transaction::LedgerEvent;
use stockfolio::ports::ledger_store_port::LedgerStorePort;
use stockfolio::ports::price_port::PricePort;

pub struct MockPricePort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_points(mut self, ticker: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(ticker.to_string(), points);
        self
    }

    pub fn with_closes(self, ticker: &str, closes: &[(&str, f64)]) -> Self {
        let points = closes
            .iter()
            .map(|(d, close)| PricePoint::new(parse(d), *close))
            .collect();
        self.with_points(ticker, points)
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl PricePort for MockPricePort {
    fn fetch_series(&self, ticker: &str) -> Result<PriceSeries, StockfolioError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(StockfolioError::Storage {
                reason: reason.clone(),
            });
        }
        match self.data.get(ticker) {
            Some(points) => Ok(PriceSeries::new(ticker, points.clone())),
            None => Err(StockfolioError::NoPriceData {
                ticker: ticker.to_string(),
                reason: "not in mock".to_string(),
            }),
        }
    }

    fn list_tickers(&self) -> Result<Vec<String>, StockfolioError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

/// Journal kept in memory; `events` is inspected directly by tests.
#[derive(Default)]
pub struct MemoryStore {
    pub events: RefCell<Vec<LedgerEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<LedgerEvent>) -> Self {
        Self {
            events: RefCell::new(events),
        }
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }
}

impl LedgerStorePort for MemoryStore {
    fn save(&self, event: &LedgerEvent) -> Result<(), StockfolioError> {
        self.events.borrow_mut().push(event.clone());
        Ok(())
    }

    fn load(&self) -> Result<Vec<LedgerEvent>, StockfolioError> {
        Ok(self.events.borrow().clone())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn parse(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// `count` consecutive daily closes rising by 1.0 from `start_price`.
pub fn generate_points(start_date: &str, count: usize, start_price: f64) -> Vec<PricePoint> {
    let start = parse(start_date);
    (0..count)
        .map(|i| PricePoint::new(start + chrono::Days::new(i as u64), start_price + i as f64))
        .collect()
}

pub fn flat_points(start_date: &str, count: usize, close: f64) -> Vec<PricePoint> {
    let start = parse(start_date);
    (0..count)
        .map(|i| PricePoint::new(start + chrono::Days::new(i as u64), close))
        .collect()
}
