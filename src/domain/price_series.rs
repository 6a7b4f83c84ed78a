//! Daily closing-price history for one ticker.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::domain::error::StockfolioError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Ascending closes with an exact-date index.
///
/// Points are sorted on construction; if a date appears twice the later entry
/// wins.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub ticker: String,
    points: Vec<PricePoint>,
    date_index: HashMap<NaiveDate, usize>,
}

impl PriceSeries {
    pub fn new(ticker: impl Into<String>, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.date == point.date => *last = point,
                _ => deduped.push(point),
            }
        }
        let date_index = deduped
            .iter()
            .enumerate()
            .map(|(i, p)| (p.date, i))
            .collect();
        Self {
            ticker: ticker.into(),
            points: deduped,
            date_index,
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.date_index.get(&date).map(|&i| self.points[i].close)
    }

    /// Index of the priced date on or before `date`.
    pub fn index_on_or_before(&self, date: NaiveDate) -> Option<usize> {
        if let Some(&i) = self.date_index.get(&date) {
            return Some(i);
        }
        let after = self.points.partition_point(|p| p.date <= date);
        after.checked_sub(1)
    }

    /// Close on `date`, or on the nearest earlier priced date.
    ///
    /// Fails with `NoPriceData` when `date` precedes the whole series.
    pub fn price_on(&self, date: NaiveDate) -> Result<f64, StockfolioError> {
        self.index_on_or_before(date)
            .map(|i| self.points[i].close)
            .ok_or_else(|| match self.first_date() {
                Some(first) => StockfolioError::no_price_data(
                    &self.ticker,
                    format!("{date} is before the first priced date {first}"),
                ),
                None => StockfolioError::no_price_data(&self.ticker, "empty price series"),
            })
    }

    /// Index used by windowed calculations: `date` must lie within the priced
    /// range, and resolves to the priced date on or before it.
    pub(crate) fn index_within_range(&self, date: NaiveDate) -> Result<usize, StockfolioError> {
        let (first, last) = match (self.first_date(), self.last_date()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(StockfolioError::no_price_data(&self.ticker, "empty price series")),
        };
        if date < first || date > last {
            return Err(StockfolioError::InvalidDate {
                date: date.to_string(),
                reason: format!("outside priced range {first} to {last} for {}", self.ticker),
            });
        }
        self.index_on_or_before(date).ok_or_else(|| StockfolioError::InvalidDate {
            date: date.to_string(),
            reason: format!("no priced date on or before it for {}", self.ticker),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_series() -> PriceSeries {
        PriceSeries::new(
            "AAA",
            vec![
                PricePoint::new(d(2023, 1, 6), 103.0),
                PricePoint::new(d(2023, 1, 3), 100.0),
                PricePoint::new(d(2023, 1, 4), 101.0),
                PricePoint::new(d(2023, 1, 5), 102.0),
            ],
        )
    }

    #[test]
    fn new_sorts_ascending() {
        let series = sample_series();
        let dates: Vec<_> = series.points().iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![d(2023, 1, 3), d(2023, 1, 4), d(2023, 1, 5), d(2023, 1, 6)]
        );
        assert_eq!(series.first_date(), Some(d(2023, 1, 3)));
        assert_eq!(series.last_date(), Some(d(2023, 1, 6)));
    }

    #[test]
    fn duplicate_dates_keep_last() {
        let series = PriceSeries::new(
            "AAA",
            vec![
                PricePoint::new(d(2023, 1, 3), 100.0),
                PricePoint::new(d(2023, 1, 3), 105.0),
            ],
        );
        assert_eq!(series.len(), 1);
        assert_eq!(series.close_on(d(2023, 1, 3)), Some(105.0));
    }

    #[test]
    fn price_on_exact_date() {
        let series = sample_series();
        assert!((series.price_on(d(2023, 1, 4)).unwrap() - 101.0).abs() < f64::EPSILON);
    }

    #[test]
    fn price_on_falls_back_over_weekend() {
        let series = sample_series();
        // Saturday and Sunday resolve to Friday's close.
        assert!((series.price_on(d(2023, 1, 7)).unwrap() - 103.0).abs() < f64::EPSILON);
        assert!((series.price_on(d(2023, 1, 8)).unwrap() - 103.0).abs() < f64::EPSILON);
    }

    #[test]
    fn price_on_before_series_fails() {
        let series = sample_series();
        let err = series.price_on(d(2023, 1, 2)).unwrap_err();
        assert!(matches!(err, StockfolioError::NoPriceData { ticker, .. } if ticker == "AAA"));
    }

    #[test]
    fn price_on_empty_series_fails() {
        let series = PriceSeries::new("AAA", vec![]);
        assert!(series.is_empty());
        assert!(matches!(
            series.price_on(d(2023, 1, 2)),
            Err(StockfolioError::NoPriceData { .. })
        ));
    }

    #[test]
    fn index_within_range_rejects_outside_dates() {
        let series = sample_series();
        assert_eq!(series.index_within_range(d(2023, 1, 5)).unwrap(), 2);
        assert!(matches!(
            series.index_within_range(d(2023, 1, 9)),
            Err(StockfolioError::InvalidDate { .. })
        ));
        assert!(matches!(
            series.index_within_range(d(2022, 12, 30)),
            Err(StockfolioError::InvalidDate { .. })
        ));
    }
}
