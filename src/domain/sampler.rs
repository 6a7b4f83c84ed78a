//! Adaptive-granularity sampling of portfolio value for performance charts.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::domain::calendar::{end_of_month, end_of_year, months_between, years_between};
use crate::domain::error::StockfolioError;
use crate::domain::portfolio::Portfolio;
use crate::domain::valuation::{value, PriceBook};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    SixDays,
    Monthly,
    SemiAnnual,
    Yearly,
}

impl Granularity {
    /// Pick the step for a span: up to 30 days daily, up to 5 whole months
    /// every 6 days, up to 30 months monthly, up to 5 years semi-annually,
    /// beyond that yearly.
    pub fn for_span(start: NaiveDate, end: NaiveDate) -> Self {
        let days = (end - start).num_days();
        if days <= 30 {
            Granularity::Daily
        } else if months_between(start, end) <= 5 {
            Granularity::SixDays
        } else if months_between(start, end) <= 30 {
            Granularity::Monthly
        } else if years_between(start, end) <= 5 {
            Granularity::SemiAnnual
        } else {
            Granularity::Yearly
        }
    }

    fn step(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Granularity::Daily => date.checked_add_days(Days::new(1)),
            Granularity::SixDays => date.checked_add_days(Days::new(6)),
            Granularity::Monthly => date.checked_add_months(Months::new(1)).map(end_of_month),
            Granularity::SemiAnnual => date.checked_add_months(Months::new(6)).map(end_of_month),
            Granularity::Yearly => end_of_year(date.year() + 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformancePoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Sample dates from `start` to `end`. The first sample is `start`; later
/// samples follow the span's granularity, and `end` is always the last.
pub fn sample_dates(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>, StockfolioError> {
    if end < start {
        return Err(StockfolioError::InvalidDate {
            date: end.to_string(),
            reason: format!("end date is before start date {start}"),
        });
    }

    let granularity = Granularity::for_span(start, end);
    let mut dates = Vec::new();
    let mut current = Some(start);
    while let Some(date) = current.filter(|d| *d <= end) {
        dates.push(date);
        current = granularity.step(date);
    }
    if dates.last() != Some(&end) {
        dates.push(end);
    }
    Ok(dates)
}

/// Portfolio value at each sample date, ascending.
pub fn performance(
    portfolio: &Portfolio,
    prices: &PriceBook,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PerformancePoint>, StockfolioError> {
    sample_dates(start, end)?
        .into_iter()
        .map(|date| {
            Ok(PerformancePoint {
                date,
                value: value(portfolio, prices, date)?,
            })
        })
        .collect()
}

/// Value represented by one bar unit: the largest value over 50.
pub fn bar_scale(points: &[PerformancePoint]) -> f64 {
    let max = points.iter().map(|p| p.value).fold(0.0, f64::max);
    max / 50.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price_series::{PricePoint, PriceSeries};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn two_day_span_is_daily() {
        let dates = sample_dates(d(2023, 1, 1), d(2023, 1, 3)).unwrap();
        assert_eq!(dates, vec![d(2023, 1, 1), d(2023, 1, 2), d(2023, 1, 3)]);
    }

    #[test]
    fn single_day_span() {
        let dates = sample_dates(d(2023, 1, 1), d(2023, 1, 1)).unwrap();
        assert_eq!(dates, vec![d(2023, 1, 1)]);
    }

    #[test]
    fn thirty_days_is_daily() {
        let dates = sample_dates(d(2023, 1, 1), d(2023, 1, 31)).unwrap();
        assert_eq!(dates.len(), 31);
        assert_eq!(Granularity::for_span(d(2023, 1, 1), d(2023, 1, 31)), Granularity::Daily);
    }

    #[test]
    fn three_months_steps_six_days() {
        let start = d(2023, 1, 1);
        let end = d(2023, 4, 1);
        assert_eq!(Granularity::for_span(start, end), Granularity::SixDays);
        let dates = sample_dates(start, end).unwrap();
        assert_eq!(dates[0], start);
        assert_eq!(dates[1], d(2023, 1, 7));
        assert_eq!(dates[2], d(2023, 1, 13));
        assert_eq!(*dates.last().unwrap(), end);
    }

    #[test]
    fn year_span_steps_to_month_ends() {
        let start = d(2023, 1, 15);
        let end = d(2024, 1, 10);
        assert_eq!(Granularity::for_span(start, end), Granularity::Monthly);
        let dates = sample_dates(start, end).unwrap();
        assert_eq!(dates[0], start);
        assert_eq!(dates[1], d(2023, 2, 28));
        assert_eq!(dates[2], d(2023, 3, 31));
        assert_eq!(dates[11], d(2023, 12, 31));
        assert_eq!(dates[12], end);
        assert_eq!(dates.len(), 13);
    }

    #[test]
    fn four_year_span_is_semi_annual() {
        let start = d(2019, 3, 10);
        let end = d(2023, 3, 1);
        assert_eq!(Granularity::for_span(start, end), Granularity::SemiAnnual);
        let dates = sample_dates(start, end).unwrap();
        assert_eq!(dates[1], d(2019, 9, 30));
        assert_eq!(dates[2], d(2020, 3, 31));
        assert_eq!(*dates.last().unwrap(), end);
    }

    #[test]
    fn decade_span_is_yearly() {
        let start = d(2010, 6, 1);
        let end = d(2020, 6, 1);
        assert_eq!(Granularity::for_span(start, end), Granularity::Yearly);
        let dates = sample_dates(start, end).unwrap();
        assert_eq!(dates[1], d(2011, 12, 31));
        assert_eq!(dates[9], d(2019, 12, 31));
        assert_eq!(*dates.last().unwrap(), end);
        assert_eq!(dates.len(), 11);
    }

    #[test]
    fn samples_are_strictly_ascending() {
        let dates = sample_dates(d(2015, 1, 31), d(2023, 7, 4)).unwrap();
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn reversed_range_fails() {
        assert!(matches!(
            sample_dates(d(2023, 1, 3), d(2023, 1, 1)),
            Err(StockfolioError::InvalidDate { .. })
        ));
    }

    #[test]
    fn performance_values_each_sample() {
        let mut portfolio = Portfolio::new("growth");
        portfolio.buy("AAA", 2.0, d(2023, 1, 2)).unwrap();
        let mut prices = PriceBook::new();
        prices.insert(PriceSeries::new(
            "AAA",
            vec![
                PricePoint::new(d(2023, 1, 2), 10.0),
                PricePoint::new(d(2023, 1, 3), 12.0),
            ],
        ));

        let points = performance(&portfolio, &prices, d(2023, 1, 1), d(2023, 1, 4)).unwrap();
        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![0.0, 20.0, 24.0, 24.0]);
    }

    #[test]
    fn bar_scale_is_max_over_fifty() {
        let points = [
            PerformancePoint { date: d(2023, 1, 1), value: 100.0 },
            PerformancePoint { date: d(2023, 1, 2), value: 500.0 },
        ];
        assert!((bar_scale(&points) - 10.0).abs() < f64::EPSILON);
        assert_eq!(bar_scale(&[]), 0.0);
    }
}
