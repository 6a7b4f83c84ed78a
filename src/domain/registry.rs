//! Named portfolios held by one caller.

use chrono::NaiveDate;

use super::error::StockfolioError;
use super::portfolio::Portfolio;
use super::transaction::{LedgerEvent, TransactionKind};

/// All portfolios of a session, in creation order.
#[derive(Debug, Clone, Default)]
pub struct PortfolioRegistry {
    portfolios: Vec<Portfolio>,
}

impl PortfolioRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.portfolios.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.portfolios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.portfolios.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.portfolios.iter().any(|p| p.name == name)
    }

    pub fn get(&self, name: &str) -> Result<&Portfolio, StockfolioError> {
        self.portfolios
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| StockfolioError::PortfolioNotFound {
                name: name.to_string(),
            })
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Portfolio, StockfolioError> {
        self.portfolios
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| StockfolioError::PortfolioNotFound {
                name: name.to_string(),
            })
    }

    /// Buy into `name`, creating the portfolio on its first purchase.
    ///
    /// A portfolio is only created when the purchase itself succeeds.
    pub fn buy(
        &mut self,
        name: &str,
        ticker: &str,
        quantity: f64,
        date: NaiveDate,
    ) -> Result<LedgerEvent, StockfolioError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StockfolioError::PortfolioNotFound {
                name: name.to_string(),
            });
        }
        if let Ok(portfolio) = self.get_mut(name) {
            return portfolio.buy(ticker, quantity, date);
        }

        let mut portfolio = Portfolio::new(name);
        let event = portfolio.buy(ticker, quantity, date)?;
        self.portfolios.push(portfolio);
        Ok(event)
    }

    pub fn sell(
        &mut self,
        name: &str,
        ticker: &str,
        quantity: f64,
        date: NaiveDate,
    ) -> Result<LedgerEvent, StockfolioError> {
        self.get_mut(name.trim())?.sell(ticker, quantity, date)
    }

    /// Copy of `name` as it stands, or `None` when it does not exist yet.
    pub(crate) fn snapshot(&self, name: &str) -> Option<Portfolio> {
        self.get(name.trim()).ok().cloned()
    }

    /// Put `name` back to a state taken by [`snapshot`](Self::snapshot).
    pub(crate) fn restore(&mut self, name: &str, snapshot: Option<Portfolio>) {
        let name = name.trim();
        match snapshot {
            Some(portfolio) => match self.portfolios.iter_mut().find(|p| p.name == name) {
                Some(slot) => *slot = portfolio,
                None => self.portfolios.push(portfolio),
            },
            None => self.portfolios.retain(|p| p.name != name),
        }
    }

    /// Replay a journaled event.
    pub fn apply(&mut self, event: &LedgerEvent) -> Result<LedgerEvent, StockfolioError> {
        match event.kind {
            TransactionKind::Purchase => {
                self.buy(&event.portfolio, &event.ticker, event.shares, event.date)
            }
            TransactionKind::Sale => {
                self.sell(&event.portfolio, &event.ticker, event.shares, event.date)
            }
            TransactionKind::Adjustment => self
                .get_mut(&event.portfolio)?
                .restore_adjustment(&event.ticker, event.date, event.shares),
        }
    }
}
