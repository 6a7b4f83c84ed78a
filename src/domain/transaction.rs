//! Ledger transactions and the persist events emitted for them.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Purchase,
    Sale,
    /// Rebalance edit of an existing lot. Not a dated trade: it never takes
    /// part in the date-ordering check.
    Adjustment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Purchase => "Purchase",
            TransactionKind::Sale => "Sale",
            TransactionKind::Adjustment => "Adjustment",
        }
    }

    pub fn is_trade(&self) -> bool {
        matches!(self, TransactionKind::Purchase | TransactionKind::Sale)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "purchase" | "buy" => Ok(TransactionKind::Purchase),
            "sale" | "sell" => Ok(TransactionKind::Sale),
            "adjustment" => Ok(TransactionKind::Adjustment),
            other => Err(format!("unknown transaction kind '{other}'")),
        }
    }
}

/// Append-only audit entry.
///
/// For `Adjustment` entries `shares` is the signed delta and `date` is the
/// acquisition date of the lot that was edited.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub ticker: String,
    pub shares: f64,
    pub date: NaiveDate,
    pub kind: TransactionKind,
}

/// A successful ledger mutation, handed back to the caller for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEvent {
    pub portfolio: String,
    pub ticker: String,
    pub shares: f64,
    pub date: NaiveDate,
    pub kind: TransactionKind,
}

impl LedgerEvent {
    pub fn from_transaction(portfolio: &str, transaction: &Transaction) -> Self {
        Self {
            portfolio: portfolio.to_string(),
            ticker: transaction.ticker.clone(),
            shares: transaction.shares,
            date: transaction.date,
            kind: transaction.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Purchase".parse(), Ok(TransactionKind::Purchase));
        assert_eq!("SALE".parse(), Ok(TransactionKind::Sale));
        assert_eq!(" adjustment ".parse(), Ok(TransactionKind::Adjustment));
        assert!("transfer".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn kind_display_matches_parse() {
        for kind in [
            TransactionKind::Purchase,
            TransactionKind::Sale,
            TransactionKind::Adjustment,
        ] {
            assert_eq!(kind.to_string().parse(), Ok(kind));
        }
    }

    #[test]
    fn only_purchases_and_sales_are_trades() {
        assert!(TransactionKind::Purchase.is_trade());
        assert!(TransactionKind::Sale.is_trade());
        assert!(!TransactionKind::Adjustment.is_trade());
    }

    #[test]
    fn event_copies_transaction() {
        let tx = Transaction {
            ticker: "AAA".into(),
            shares: 5.0,
            date: NaiveDate::from_ymd_opt(2023, 1, 3).unwrap(),
            kind: TransactionKind::Sale,
        };
        let event = LedgerEvent::from_transaction("growth", &tx);
        assert_eq!(event.portfolio, "growth");
        assert_eq!(event.ticker, "AAA");
        assert_eq!(event.kind, TransactionKind::Sale);
        assert_eq!(event.date, tx.date);
    }
}
