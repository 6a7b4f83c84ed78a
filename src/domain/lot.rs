//! Dated share lots.

use chrono::NaiveDate;

/// Tolerance for share arithmetic; fractional shares are plain `f64`.
pub const SHARE_EPSILON: f64 = 1e-9;

/// Shares of one ticker acquired on one date. Identity is `(ticker, acquired)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lot {
    pub ticker: String,
    pub shares: f64,
    pub acquired: NaiveDate,
}

impl Lot {
    pub fn new(ticker: impl Into<String>, shares: f64, acquired: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            shares,
            acquired,
        }
    }

    pub fn is_key(&self, ticker: &str, acquired: NaiveDate) -> bool {
        self.ticker == ticker && self.acquired == acquired
    }

    /// Held as of `date` under cumulative lot accounting.
    pub fn counts_on(&self, date: NaiveDate) -> bool {
        self.acquired <= date
    }

    pub fn is_active(&self) -> bool {
        self.shares > SHARE_EPSILON
    }

    /// Subtract up to `quantity`, never below zero; returns what was taken.
    pub(crate) fn take(&mut self, quantity: f64) -> f64 {
        let taken = quantity.min(self.shares).max(0.0);
        self.shares -= taken;
        if self.shares < SHARE_EPSILON {
            self.shares = 0.0;
        }
        taken
    }
}
