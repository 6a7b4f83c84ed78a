//! Session orchestrator: owns the portfolio registry and forwards commands
//! between the ledger, the analytics and the two ports.
//!
//! Every successful mutation is persisted through the [`LedgerStorePort`]
//! before the call returns; a failed write undoes the in-memory change. Queries fetch the price series they need once per
//! call through the [`PricePort`].

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::domain::error::StockfolioError;
use crate::domain::indicator;
use crate::domain::portfolio::{normalize_ticker, Portfolio};
use crate::domain::rebalance::{self, RebalanceOutcome};
use crate::domain::registry::PortfolioRegistry;
use crate::domain::sampler::{self, PerformancePoint};
use crate::domain::transaction::LedgerEvent;
use crate::domain::valuation::{self, PriceBook};
use crate::ports::ledger_store_port::LedgerStorePort;
use crate::ports::price_port::PricePort;

pub struct Engine<'a> {
    registry: PortfolioRegistry,
    prices: &'a dyn PricePort,
    store: &'a dyn LedgerStorePort,
}

impl<'a> Engine<'a> {
    /// Rebuild the registry by replaying the journal, then serve commands.
    pub fn open(
        prices: &'a dyn PricePort,
        store: &'a dyn LedgerStorePort,
    ) -> Result<Self, StockfolioError> {
        let events = store.load()?;
        let mut registry = PortfolioRegistry::new();
        for event in &events {
            registry.apply(event)?;
        }
        debug!(
            events = events.len(),
            portfolios = registry.len(),
            "replayed ledger journal"
        );
        Ok(Self {
            registry,
            prices,
            store,
        })
    }

    pub fn registry(&self) -> &PortfolioRegistry {
        &self.registry
    }

    pub fn portfolio(&self, name: &str) -> Result<&Portfolio, StockfolioError> {
        self.registry.get(name)
    }

    pub fn portfolios(&self) -> Vec<&str> {
        self.registry.names()
    }

    pub fn buy(
        &mut self,
        portfolio: &str,
        ticker: &str,
        quantity: f64,
        date: NaiveDate,
    ) -> Result<LedgerEvent, StockfolioError> {
        let snapshot = self.registry.snapshot(portfolio);
        let event = self.registry.buy(portfolio, ticker, quantity, date)?;
        self.persist(portfolio, snapshot, std::slice::from_ref(&event))?;
        info!(portfolio, ticker = %event.ticker, shares = quantity, %date, "bought");
        Ok(event)
    }

    pub fn sell(
        &mut self,
        portfolio: &str,
        ticker: &str,
        quantity: f64,
        date: NaiveDate,
    ) -> Result<LedgerEvent, StockfolioError> {
        let snapshot = self.registry.snapshot(portfolio);
        let event = self.registry.sell(portfolio, ticker, quantity, date)?;
        self.persist(portfolio, snapshot, std::slice::from_ref(&event))?;
        info!(portfolio, ticker = %event.ticker, shares = quantity, %date, "sold");
        Ok(event)
    }

    pub fn rebalance(
        &mut self,
        portfolio: &str,
        date: NaiveDate,
        weights: &[i64],
    ) -> Result<RebalanceOutcome, StockfolioError> {
        let held: Vec<String> = self
            .registry
            .get(portfolio)?
            .held_tickers(date)
            .into_iter()
            .map(str::to_string)
            .collect();
        let book = self.price_book(held.iter().map(String::as_str))?;

        let snapshot = self.registry.snapshot(portfolio);
        let outcome = rebalance::rebalance(self.registry.get_mut(portfolio)?, &book, date, weights)?;
        self.persist(portfolio, snapshot, &outcome.events)?;
        info!(
            portfolio,
            %date,
            adjustments = outcome.events.len(),
            "rebalanced"
        );
        Ok(outcome)
    }

    pub fn value(&self, portfolio: &str, date: NaiveDate) -> Result<f64, StockfolioError> {
        let portfolio = self.registry.get(portfolio)?;
        let book = self.price_book(priced_tickers(portfolio, date))?;
        valuation::value(portfolio, &book, date)
    }

    pub fn composition(
        &self,
        portfolio: &str,
        date: NaiveDate,
    ) -> Result<BTreeMap<String, f64>, StockfolioError> {
        Ok(self.registry.get(portfolio)?.composition(date))
    }

    pub fn distribution(
        &self,
        portfolio: &str,
        date: NaiveDate,
    ) -> Result<BTreeMap<String, f64>, StockfolioError> {
        let portfolio = self.registry.get(portfolio)?;
        let book = self.price_book(priced_tickers(portfolio, date))?;
        valuation::distribution(portfolio, &book, date)
    }

    /// Close on `date` for every held ticker, in lot order.
    pub fn closing_prices(
        &self,
        portfolio: &str,
        date: NaiveDate,
    ) -> Result<Vec<(String, f64)>, StockfolioError> {
        let portfolio = self.registry.get(portfolio)?;
        let book = self.price_book(portfolio.held_tickers(date))?;
        valuation::closing_prices(portfolio, &book, date)
    }

    pub fn performance(
        &self,
        portfolio: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PerformancePoint>, StockfolioError> {
        let portfolio = self.registry.get(portfolio)?;
        // Holdings only shrink looking backwards, so the tickers priced at
        // `end` cover every earlier sample.
        let book = self.price_book(priced_tickers(portfolio, end))?;
        sampler::performance(portfolio, &book, start, end)
    }

    pub fn gain_loss(
        &self,
        ticker: &str,
        recent: NaiveDate,
        initial: NaiveDate,
    ) -> Result<f64, StockfolioError> {
        let series = self.prices.fetch_series(&normalize_ticker(ticker)?)?;
        indicator::gain_loss(&series, recent, initial)
    }

    pub fn moving_average(
        &self,
        ticker: &str,
        date: NaiveDate,
        window: usize,
    ) -> Result<f64, StockfolioError> {
        let series = self.prices.fetch_series(&normalize_ticker(ticker)?)?;
        indicator::moving_average(&series, date, window)
    }

    pub fn crossovers(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        window: usize,
    ) -> Result<Vec<NaiveDate>, StockfolioError> {
        let series = self.prices.fetch_series(&normalize_ticker(ticker)?)?;
        indicator::find_crossovers(&series, start, end, window)
    }

    pub fn available_tickers(&self) -> Result<Vec<String>, StockfolioError> {
        self.prices.list_tickers()
    }

    fn price_book<'t>(
        &self,
        tickers: impl IntoIterator<Item = &'t str>,
    ) -> Result<PriceBook, StockfolioError> {
        let tickers: Vec<&str> = tickers.into_iter().collect();
        debug!(count = tickers.len(), "loading price series");
        PriceBook::load(self.prices, &tickers)
    }

    /// Journal `events`, or put `portfolio` back to `snapshot` if the write fails.
    fn persist(
        &mut self,
        portfolio: &str,
        snapshot: Option<Portfolio>,
        events: &[LedgerEvent],
    ) -> Result<(), StockfolioError> {
        if let Err(e) = self.store.save_all(events) {
            warn!(portfolio, error = %e, "journal write failed, rolling back");
            self.registry.restore(portfolio, snapshot);
            return Err(e);
        }
        Ok(())
    }
}

/// Held tickers with a non-zero position on `date`; only these need a price.
fn priced_tickers(portfolio: &Portfolio, date: NaiveDate) -> Vec<&str> {
    portfolio
        .held_tickers(date)
        .into_iter()
        .filter(|ticker| portfolio.valid_shares(ticker, date) != 0.0)
        .collect()
}
