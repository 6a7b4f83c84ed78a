//! Weight-based rebalancing of a portfolio's holdings as of a date.
//!
//! Rebalancing is an administrative edit: shares move inside existing lots and
//! are logged as `Adjustment` transactions rather than dated trades.

use chrono::NaiveDate;

use crate::domain::error::StockfolioError;
use crate::domain::lot::SHARE_EPSILON;
use crate::domain::portfolio::Portfolio;
use crate::domain::transaction::LedgerEvent;
use crate::domain::valuation::PriceBook;

#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceOutcome {
    /// Ticker and post-rebalance shares, aligned with the input weights.
    pub holdings: Vec<(String, f64)>,
    pub events: Vec<LedgerEvent>,
}

#[derive(Debug, Clone)]
struct Leg {
    ticker: String,
    price: f64,
    shares: f64,
    delta: f64,
}

fn check_weights(weights: &[i64], tickers: &[&str]) -> Result<(), StockfolioError> {
    if weights.len() != tickers.len() {
        return Err(StockfolioError::InvalidWeights {
            reason: format!(
                "expected {} weights for {}, got {}",
                tickers.len(),
                tickers.join(", "),
                weights.len()
            ),
        });
    }
    if let Some(w) = weights.iter().find(|&&w| w < 0) {
        return Err(StockfolioError::InvalidWeights {
            reason: format!("weight {w} is negative"),
        });
    }
    let total: i64 = weights.iter().sum();
    if total != 100 {
        return Err(StockfolioError::WeightSum { total });
    }
    Ok(())
}

/// Rebalance so each held ticker's share of total value matches its weight.
///
/// `weights` align with [`Portfolio::held_tickers`] for `date` (lot
/// enumeration order) and must be non-negative integers summing to 100.
/// Prices are the closes on `date` with backward fallback, the same lookup
/// `value` uses. The portfolio is untouched unless every leg succeeds.
pub fn rebalance(
    portfolio: &mut Portfolio,
    prices: &PriceBook,
    date: NaiveDate,
    weights: &[i64],
) -> Result<RebalanceOutcome, StockfolioError> {
    let tickers = portfolio.held_tickers(date);
    check_weights(weights, &tickers)?;

    let mut legs = Vec::with_capacity(tickers.len());
    let mut current_values = Vec::with_capacity(tickers.len());
    for &ticker in &tickers {
        let price = prices.price_on(ticker, date)?;
        if price <= 0.0 {
            return Err(StockfolioError::no_price_data(
                ticker,
                format!("non-positive close {price} on {date}"),
            ));
        }
        let shares = portfolio.valid_shares(ticker, date);
        current_values.push(shares * price);
        legs.push(Leg {
            ticker: ticker.to_string(),
            price,
            shares,
            delta: 0.0,
        });
    }

    let total_value: f64 = current_values.iter().sum();
    for (leg, &weight) in legs.iter_mut().zip(weights) {
        let target_shares = weight as f64 / 100.0 * total_value / leg.price;
        // A full sell-down takes exactly the holding.
        leg.delta = (target_shares - leg.shares).max(-leg.shares);
    }

    let snapshot = portfolio.clone();
    let mut events = Vec::new();
    for leg in legs.iter().filter(|leg| leg.delta.abs() > SHARE_EPSILON) {
        match portfolio.adjust_holding(&leg.ticker, date, leg.delta) {
            Ok(leg_events) => events.extend(leg_events),
            Err(e) => {
                *portfolio = snapshot;
                return Err(e);
            }
        }
    }

    let holdings = legs
        .into_iter()
        .map(|leg| {
            let shares = portfolio.valid_shares(&leg.ticker, date);
            (leg.ticker, shares)
        })
        .collect();
    Ok(RebalanceOutcome { holdings, events })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price_series::{PricePoint, PriceSeries};
    use crate::domain::transaction::TransactionKind;
    use crate::domain::valuation::value;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn book() -> PriceBook {
        let mut book = PriceBook::new();
        book.insert(PriceSeries::new(
            "AAA",
            vec![PricePoint::new(d(2023, 1, 3), 100.0)],
        ));
        book.insert(PriceSeries::new("BBB", vec![PricePoint::new(d(2023, 1, 3), 50.0)]));
        book.insert(PriceSeries::new("CCC", vec![PricePoint::new(d(2023, 1, 3), 10.0)]));
        book
    }

    fn sample_portfolio() -> Portfolio {
        let mut portfolio = Portfolio::new("growth");
        portfolio.buy("AAA", 10.0, d(2023, 1, 3)).unwrap();
        portfolio.buy("BBB", 10.0, d(2023, 1, 3)).unwrap();
        portfolio
    }

    #[test]
    fn rebalance_to_even_split() {
        let mut portfolio = sample_portfolio();
        let date = d(2023, 1, 5);
        let outcome = rebalance(&mut portfolio, &book(), date, &[50, 50]).unwrap();

        // Total 1500: AAA 750 / 100 = 7.5, BBB 750 / 50 = 15.
        assert_eq!(outcome.holdings[0].0, "AAA");
        assert!((outcome.holdings[0].1 - 7.5).abs() < 1e-9);
        assert_eq!(outcome.holdings[1].0, "BBB");
        assert!((outcome.holdings[1].1 - 15.0).abs() < 1e-9);
        assert!((value(&portfolio, &book(), date).unwrap() - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn rebalance_logs_adjustments() {
        let mut portfolio = sample_portfolio();
        let outcome = rebalance(&mut portfolio, &book(), d(2023, 1, 5), &[50, 50]).unwrap();

        assert_eq!(outcome.events.len(), 2);
        assert!(outcome.events.iter().all(|e| e.kind == TransactionKind::Adjustment));
        assert!((outcome.events[0].shares - (-2.5)).abs() < 1e-9);
        assert!((outcome.events[1].shares - 5.0).abs() < 1e-9);
        assert_eq!(portfolio.transactions().len(), 4);
    }

    #[test]
    fn rebalance_already_balanced_is_noop() {
        let mut portfolio = Portfolio::new("growth");
        portfolio.buy("AAA", 5.0, d(2023, 1, 3)).unwrap();
        portfolio.buy("BBB", 10.0, d(2023, 1, 3)).unwrap();
        let outcome = rebalance(&mut portfolio, &book(), d(2023, 1, 3), &[50, 50]).unwrap();
        assert!(outcome.events.is_empty());
    }

    #[test]
    fn rebalance_to_zero_weight_sells_out() {
        let mut portfolio = sample_portfolio();
        let outcome = rebalance(&mut portfolio, &book(), d(2023, 1, 3), &[100, 0]).unwrap();
        assert!((outcome.holdings[0].1 - 15.0).abs() < 1e-9);
        assert!(outcome.holdings[1].1.abs() < 1e-9);
    }

    #[test]
    fn zero_weight_on_large_fractional_holding() {
        let date = d(2023, 1, 3);
        for k in 0..200u32 {
            let shares = 123_456_789.0 + f64::from(k) * 0.37;
            let price = 3.0 + f64::from(k) * 0.013;
            let mut book = PriceBook::new();
            book.insert(PriceSeries::new("AAA", vec![PricePoint::new(date, price)]));
            book.insert(PriceSeries::new("BBB", vec![PricePoint::new(date, 50.0)]));

            let mut portfolio = Portfolio::new("growth");
            portfolio.buy("AAA", shares, date).unwrap();
            portfolio.buy("BBB", 10.0, date).unwrap();

            let outcome = rebalance(&mut portfolio, &book, date, &[0, 100]).unwrap();
            assert_eq!(outcome.holdings[0].1, 0.0);
            let expected = (shares * price + 500.0) / 50.0;
            assert!((outcome.holdings[1].1 - expected).abs() / expected < 1e-12);
        }
    }

    #[test]
    fn weights_must_sum_to_100() {
        let mut portfolio = sample_portfolio();
        let before = portfolio.clone();
        let err = rebalance(&mut portfolio, &book(), d(2023, 1, 3), &[40, 50]).unwrap_err();
        assert!(matches!(err, StockfolioError::WeightSum { total: 90 }));
        assert_eq!(portfolio, before);
    }

    #[test]
    fn weight_count_must_match_tickers() {
        let mut portfolio = sample_portfolio();
        let err = rebalance(&mut portfolio, &book(), d(2023, 1, 3), &[100]).unwrap_err();
        assert!(matches!(err, StockfolioError::InvalidWeights { .. }));
    }

    #[test]
    fn negative_weights_rejected() {
        let mut portfolio = sample_portfolio();
        let err = rebalance(&mut portfolio, &book(), d(2023, 1, 3), &[120, -20]).unwrap_err();
        assert!(matches!(err, StockfolioError::InvalidWeights { .. }));
    }

    #[test]
    fn tickers_acquired_later_are_not_weighted() {
        let mut portfolio = sample_portfolio();
        portfolio.buy("CCC", 3.0, d(2023, 2, 1)).unwrap();
        let outcome = rebalance(&mut portfolio, &book(), d(2023, 1, 5), &[25, 75]).unwrap();
        assert_eq!(outcome.holdings.len(), 2);
        assert!((portfolio.lot("CCC", d(2023, 2, 1)).unwrap().shares - 3.0).abs() < 1e-9);
    }

    #[test]
    fn missing_price_leaves_portfolio_unchanged() {
        let mut portfolio = sample_portfolio();
        portfolio.buy("DDD", 1.0, d(2023, 1, 3)).unwrap();
        let before = portfolio.clone();
        let err = rebalance(&mut portfolio, &book(), d(2023, 1, 3), &[30, 30, 40]).unwrap_err();
        assert!(matches!(err, StockfolioError::NoPriceData { .. }));
        assert_eq!(portfolio, before);
    }
}
