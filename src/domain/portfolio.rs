//! Position ledger: dated lots plus the append-only transaction log.
//!
//! Lot identity is `(ticker, acquired)`. Purchases on the same date
//! accumulate into one lot; purchases on different dates never merge. Shares
//! held as of a date are the sum over lots acquired on or before it.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::error::StockfolioError;
use super::lot::{Lot, SHARE_EPSILON};
use super::transaction::{LedgerEvent, Transaction, TransactionKind};

const MAX_TICKER_LEN: usize = 10;

/// Trim and upper-case a ticker, rejecting anything that is not 1-10
/// characters of `A-Z`, `0-9`, `.` or `-`.
pub fn normalize_ticker(ticker: &str) -> Result<String, StockfolioError> {
    let normalized = ticker.trim().to_uppercase();
    let valid = !normalized.is_empty()
        && normalized.len() <= MAX_TICKER_LEN
        && normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if valid {
        Ok(normalized)
    } else {
        Err(StockfolioError::InvalidTicker {
            ticker: ticker.to_string(),
        })
    }
}

fn check_quantity(quantity: f64) -> Result<(), StockfolioError> {
    if quantity.is_finite() && quantity > 0.0 {
        Ok(())
    } else {
        Err(StockfolioError::InvalidShares { shares: quantity })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub name: String,
    lots: Vec<Lot>,
    transactions: Vec<Transaction>,
}

impl Portfolio {
    pub fn new(name: impl Into<String>) -> Self {
        Portfolio {
            name: name.into(),
            lots: Vec::new(),
            transactions: Vec::new(),
        }
    }

    /// Lots in enumeration (creation) order.
    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn lot(&self, ticker: &str, acquired: NaiveDate) -> Option<&Lot> {
        self.lots.iter().find(|lot| lot.is_key(ticker, acquired))
    }

    /// Distinct tickers in lot-enumeration order.
    pub fn tickers(&self) -> Vec<&str> {
        let mut tickers: Vec<&str> = Vec::new();
        for lot in &self.lots {
            if !tickers.contains(&lot.ticker.as_str()) {
                tickers.push(&lot.ticker);
            }
        }
        tickers
    }

    /// Distinct tickers with at least one lot acquired on or before `date`.
    pub fn held_tickers(&self, date: NaiveDate) -> Vec<&str> {
        let mut tickers: Vec<&str> = Vec::new();
        for lot in self.lots.iter().filter(|lot| lot.counts_on(date)) {
            if !tickers.contains(&lot.ticker.as_str()) {
                tickers.push(&lot.ticker);
            }
        }
        tickers
    }

    /// Latest purchase or sale date recorded for `ticker`.
    pub fn latest_trade_date(&self, ticker: &str) -> Option<NaiveDate> {
        self.transactions
            .iter()
            .filter(|tx| tx.kind.is_trade() && tx.ticker == ticker)
            .map(|tx| tx.date)
            .max()
    }

    fn check_order(&self, ticker: &str, date: NaiveDate) -> Result<(), StockfolioError> {
        match self.latest_trade_date(ticker) {
            Some(latest) if date < latest => Err(StockfolioError::NonMonotonicTransaction {
                ticker: ticker.to_string(),
                date,
                latest,
            }),
            _ => Ok(()),
        }
    }

    fn record(&mut self, ticker: &str, shares: f64, date: NaiveDate, kind: TransactionKind) -> LedgerEvent {
        let tx = Transaction {
            ticker: ticker.to_string(),
            shares,
            date,
            kind,
        };
        let event = LedgerEvent::from_transaction(&self.name, &tx);
        self.transactions.push(tx);
        event
    }

    /// Indices of `ticker`'s lots acquired on or before `date`, most recent first.
    fn lots_on_or_before_desc(&self, ticker: &str, date: NaiveDate) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .lots
            .iter()
            .enumerate()
            .filter(|(_, lot)| lot.ticker == ticker && lot.counts_on(date))
            .map(|(i, _)| i)
            .collect();
        indices.sort_by(|&a, &b| self.lots[b].acquired.cmp(&self.lots[a].acquired));
        indices
    }

    pub fn buy(
        &mut self,
        ticker: &str,
        quantity: f64,
        date: NaiveDate,
    ) -> Result<LedgerEvent, StockfolioError> {
        let ticker = normalize_ticker(ticker)?;
        check_quantity(quantity)?;
        self.check_order(&ticker, date)?;

        match self.lots.iter_mut().find(|lot| lot.is_key(&ticker, date)) {
            Some(lot) => lot.shares += quantity,
            None => self.lots.push(Lot::new(ticker.clone(), quantity, date)),
        }
        Ok(self.record(&ticker, quantity, date, TransactionKind::Purchase))
    }

    /// Sell against the aggregate holding as of `date`.
    ///
    /// The lot dated `date` is drawn down first, then earlier lots from the
    /// most recent backwards. Nothing changes unless the whole quantity is
    /// available.
    pub fn sell(
        &mut self,
        ticker: &str,
        quantity: f64,
        date: NaiveDate,
    ) -> Result<LedgerEvent, StockfolioError> {
        let ticker = normalize_ticker(ticker)?;
        check_quantity(quantity)?;
        self.check_order(&ticker, date)?;

        let available = self.valid_shares(&ticker, date);
        if quantity > available + SHARE_EPSILON {
            return Err(StockfolioError::InsufficientShares {
                ticker,
                date,
                requested: quantity,
                available,
            });
        }

        let mut remaining = quantity;
        for i in self.lots_on_or_before_desc(&ticker, date) {
            if remaining <= SHARE_EPSILON {
                break;
            }
            remaining -= self.lots[i].take(remaining);
        }
        Ok(self.record(&ticker, quantity, date, TransactionKind::Sale))
    }

    /// Shares of `ticker` held as of `date`.
    pub fn valid_shares(&self, ticker: &str, date: NaiveDate) -> f64 {
        self.lots
            .iter()
            .filter(|lot| lot.ticker == ticker && lot.counts_on(date))
            .map(|lot| lot.shares)
            .sum()
    }

    /// Ticker → shares over lots acquired on or before `date`, plus any
    /// later lot that still holds shares.
    pub fn composition(&self, date: NaiveDate) -> BTreeMap<String, f64> {
        let mut composition = BTreeMap::new();
        for lot in self
            .lots
            .iter()
            .filter(|lot| lot.counts_on(date) || lot.is_active())
        {
            *composition.entry(lot.ticker.clone()).or_insert(0.0) += lot.shares;
        }
        composition
    }

    /// Move `ticker`'s holding as of `date` by `delta` shares, editing lots in
    /// place and logging one `Adjustment` per lot touched.
    ///
    /// Increases land on the most recent lot on or before `date`; decreases
    /// draw down from the most recent lot backwards.
    pub(crate) fn adjust_holding(
        &mut self,
        ticker: &str,
        date: NaiveDate,
        delta: f64,
    ) -> Result<Vec<LedgerEvent>, StockfolioError> {
        let candidates = self.lots_on_or_before_desc(ticker, date);
        let Some(&newest) = candidates.first() else {
            return Err(StockfolioError::InvalidDate {
                date: date.to_string(),
                reason: format!("no {ticker} lot acquired on or before it"),
            });
        };
        if delta < 0.0 {
            let available = self.valid_shares(ticker, date);
            let tolerance = SHARE_EPSILON * available.max(1.0);
            if -delta > available + tolerance {
                return Err(StockfolioError::InsufficientShares {
                    ticker: ticker.to_string(),
                    date,
                    requested: -delta,
                    available,
                });
            }
        }

        let mut events = Vec::new();
        if delta > 0.0 {
            self.lots[newest].shares += delta;
            let acquired = self.lots[newest].acquired;
            events.push(self.record(ticker, delta, acquired, TransactionKind::Adjustment));
        } else {
            let mut remaining = -delta;
            for i in candidates {
                if remaining <= SHARE_EPSILON {
                    break;
                }
                let taken = self.lots[i].take(remaining);
                if taken > 0.0 {
                    remaining -= taken;
                    let acquired = self.lots[i].acquired;
                    events.push(self.record(ticker, -taken, acquired, TransactionKind::Adjustment));
                }
            }
        }
        Ok(events)
    }

    /// Re-apply a journaled adjustment to the exact lot it edited.
    pub(crate) fn restore_adjustment(
        &mut self,
        ticker: &str,
        acquired: NaiveDate,
        delta: f64,
    ) -> Result<LedgerEvent, StockfolioError> {
        let lot = self
            .lots
            .iter_mut()
            .find(|lot| lot.is_key(ticker, acquired))
            .ok_or_else(|| StockfolioError::Storage {
                reason: format!(
                    "journal adjusts missing lot {ticker} {acquired} in '{}'",
                    self.name
                ),
            })?;
        lot.shares = (lot.shares + delta).max(0.0);
        Ok(self.record(ticker, delta, acquired, TransactionKind::Adjustment))
    }
}
